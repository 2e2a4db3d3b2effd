use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left unescaped in mailto query values (RFC 3986 unreserved).
const MAILTO_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the `mailto:` link the contact form redirects to.
///
/// The sender's name, address and message are folded into the body so the
/// site owner's mail client opens a ready-to-send reply; nothing is
/// delivered server-side.
pub fn contact_link(
    recipient: &str,
    subject: &str,
    sender_name: &str,
    sender_email: &str,
    message: &str,
) -> String {
    let body = format!(
        "Name: {}\nEmail: {}\n\nMessage:\n{}",
        sender_name, sender_email, message
    );

    format!(
        "mailto:{}?subject={}&body={}",
        recipient,
        utf8_percent_encode(subject, MAILTO_VALUE),
        utf8_percent_encode(&body, MAILTO_VALUE)
    )
}
