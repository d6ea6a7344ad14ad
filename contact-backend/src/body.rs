use crate::submission::ValidatedSubmission;
use serde::Serialize;
use serde_json::Value;
use tinytemplate::{error::Error, format, TinyTemplate};

const MESSAGE_TEMPLATE_NAME: &str = "contact-message";
const MESSAGE_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/assets/message.html"
));

#[derive(Serialize)]
struct Context<'a> {
    name: &'a str,
    email: &'a str,
    subject: &'a str,
    message: &'a str,
}

/// Body of the message handed to the local mail transport agent. Plain text,
/// so field values are interpolated without any escaping.
pub fn plain_text_body(submission: &ValidatedSubmission) -> String {
    format!(
        "You have received a new message from the contact form.\n\n\
         Name: {}\n\
         Email: {}\n\n\
         Message:\n\
         {}\n",
        submission.name, submission.email, submission.message
    )
}

/// Body of the message submitted over SMTP. All field values pass through
/// tinytemplate's escaping formatter before landing in the markup.
pub fn html_body(submission: &ValidatedSubmission) -> String {
    let mut tt = TinyTemplate::new();
    tt.add_formatter("paragraphs", render_paragraphs);
    tt.add_template(MESSAGE_TEMPLATE_NAME, MESSAGE_TEMPLATE)
        .unwrap();
    let context = Context {
        name: submission.name,
        email: submission.email,
        subject: submission.subject,
        message: submission.message,
    };
    tt.render(MESSAGE_TEMPLATE_NAME, &context).unwrap()
}

fn render_paragraphs(value: &Value, output: &mut String) -> Result<(), Error> {
    output.push_str("<p>");
    let mut formatted = String::new();
    format(value, &mut formatted)?;
    output.push_str(&formatted.replace("\n\n", "</p><p>"));
    output.push_str("</p>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{html_body, plain_text_body};
    use crate::submission::ValidatedSubmission;
    use googletest::prelude::*;

    const MALICIOUS_CONTENT: &str = "<script>doEvil();</script>";

    fn arbitrary() -> ValidatedSubmission<'static> {
        ValidatedSubmission::for_testing(
            "Arbitrary sender",
            "email@example.com",
            "Test",
            "Test message",
        )
    }

    #[test]
    fn renders_all_fields_verbatim_in_html_body() -> Result<()> {
        let output = html_body(&arbitrary());

        verify_that!(output, contains_substring("Arbitrary sender"))?;
        verify_that!(output, contains_substring("email@example.com"))?;
        verify_that!(output, contains_substring("Test"))?;
        verify_that!(output, contains_substring("Test message"))
    }

    #[test]
    fn escapes_markup_in_name() -> Result<()> {
        let submission = ValidatedSubmission::for_testing(
            MALICIOUS_CONTENT,
            "email@example.com",
            "Test",
            "Test message",
        );

        let output = html_body(&submission);

        verify_that!(output, not(contains_substring(MALICIOUS_CONTENT)))
    }

    #[test]
    fn escapes_markup_in_subject() -> Result<()> {
        let submission = ValidatedSubmission::for_testing(
            "Arbitrary sender",
            "email@example.com",
            MALICIOUS_CONTENT,
            "Test message",
        );

        let output = html_body(&submission);

        verify_that!(output, not(contains_substring(MALICIOUS_CONTENT)))
    }

    #[test]
    fn escapes_markup_in_message() -> Result<()> {
        let submission = ValidatedSubmission::for_testing(
            "Arbitrary sender",
            "email@example.com",
            "Test",
            MALICIOUS_CONTENT,
        );

        let output = html_body(&submission);

        verify_that!(output, not(contains_substring(MALICIOUS_CONTENT)))
    }

    #[test]
    fn renders_paragraphs_in_message() -> Result<()> {
        let submission = ValidatedSubmission::for_testing(
            "Arbitrary sender",
            "email@example.com",
            "Test",
            "A paragraph\n\nAnother paragraph",
        );

        let output = html_body(&submission);

        verify_that!(
            output,
            contains_substring("<p>A paragraph</p><p>Another paragraph</p>")
        )
    }

    #[test]
    fn lays_out_the_plain_text_body() -> Result<()> {
        let output = plain_text_body(&arbitrary());

        verify_that!(
            output,
            eq("You have received a new message from the contact form.\n\n\
                Name: Arbitrary sender\n\
                Email: email@example.com\n\n\
                Message:\n\
                Test message\n")
        )
    }

    #[test]
    fn leaves_plain_text_unescaped() -> Result<()> {
        let submission = ValidatedSubmission::for_testing(
            "Arbitrary sender",
            "email@example.com",
            "Test",
            "a < b && b > c",
        );

        let output = plain_text_body(&submission);

        verify_that!(output, contains_substring("a < b && b > c"))
    }
}
