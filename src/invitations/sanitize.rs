/// Free-text sanitization for user-supplied fields
///
/// Never rejects input: markup is removed and the remainder returned.
use super::InvitationData;
use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));
static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static JAVASCRIPT_URI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)javascript\s*:").expect("valid regex"));
static EVENT_HANDLER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bon[a-z]+\s*=").expect("valid regex"));

/// Characters removed outright after markup stripping
const STRIPPED_CHARS: &[char] = &['<', '>', '(', ')', '[', ']', '{', '}', '"', '\'', '`'];

/// Strip HTML, script content, and special characters from `input`
pub fn sanitize_input(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    let without_tags = HTML_TAG.replace_all(&without_scripts, "");
    let without_uris = JAVASCRIPT_URI.replace_all(&without_tags, "");
    let without_handlers = EVENT_HANDLER.replace_all(&without_uris, "");

    without_handlers
        .chars()
        .filter(|c| !STRIPPED_CHARS.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitize every present field of an invitation request
pub fn sanitize_invitation_data(data: &InvitationData) -> InvitationData {
    InvitationData {
        team_id: data.team_id.as_deref().map(sanitize_input),
        invited_email: data.invited_email.as_deref().map(sanitize_input),
        invited_by: data.invited_by.as_deref().map(sanitize_input),
        role: data.role.as_deref().map(sanitize_input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_script_blocks() {
        assert_eq!(sanitize_input("<script>alert('xss')</script>John"), "John");
        assert_eq!(
            sanitize_input("Jo<SCRIPT type=\"text/javascript\">\nsteal()\n</SCRIPT>hn"),
            "John"
        );
    }

    #[test]
    fn test_removes_tags_but_keeps_text() {
        assert_eq!(sanitize_input("<b>Jane</b>"), "Jane");
        assert_eq!(sanitize_input("<img src=x onerror=alert(1)>Bob"), "Bob");
    }

    #[test]
    fn test_strips_brackets_and_quotes() {
        assert_eq!(sanitize_input("Jane (Doe) [admin] {x}"), "Jane Doe admin x");
        assert_eq!(sanitize_input("O'Brien"), "OBrien");
    }

    #[test]
    fn test_strips_javascript_uris_and_handlers() {
        assert_eq!(sanitize_input("javascript:alert(1)"), "alert1");
        assert_eq!(sanitize_input("x onclick=run"), "x run");
    }

    #[test]
    fn test_preserves_well_formed_email() {
        let email = "user+test@example-domain.com";
        assert_eq!(sanitize_input(email), email);
        assert_eq!(sanitize_input("first.last@sub.example.org"), "first.last@sub.example.org");
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_input("   team-42  \n"), "team-42");
        assert_eq!(sanitize_input(""), "");
    }

    #[test]
    fn test_sanitize_invitation_data_keeps_missing_fields_missing() {
        let data = InvitationData {
            team_id: Some(" <i>team-1</i> ".to_string()),
            invited_email: None,
            invited_by: Some("user-1".to_string()),
            role: Some("team_member".to_string()),
        };

        let clean = sanitize_invitation_data(&data);
        assert_eq!(clean.team_id.as_deref(), Some("team-1"));
        assert!(clean.invited_email.is_none());
        assert_eq!(clean.invited_by.as_deref(), Some("user-1"));
        assert_eq!(clean.role.as_deref(), Some("team_member"));
    }
}
