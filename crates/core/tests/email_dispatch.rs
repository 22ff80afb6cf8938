//! Email dispatcher integration tests.
//!
//! Notification body -> validated email -> MIME message -> mailer

use std::sync::Arc;

use nics_processors_core::{
    email::{DispatchOutcome, EmailDispatcher, EmailKind, ATTACHED_IMAGE_NAME},
    testing::{fixtures, MockMailer},
};

fn setup() -> (Arc<MockMailer>, EmailDispatcher) {
    let mailer = Arc::new(MockMailer::new());
    let dispatcher = EmailDispatcher::new(mailer.clone());
    (mailer, dispatcher)
}

#[tokio::test]
async fn test_simple_email_is_plain_text() {
    let (mailer, dispatcher) = setup();

    let report = dispatcher
        .dispatch(&fixtures::simple_email(
            "ops@example.org",
            "Incident created",
            "Ridge Fire was created.",
        ))
        .await;

    assert_eq!(report.kind, EmailKind::Simple);
    assert_eq!(report.outcome, DispatchOutcome::Sent { recipients: 1 });

    let sent = mailer.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from.as_deref(), Some("nics@example.org"));
    assert!(sent[0].formatted.contains("Subject: Incident created"));
    assert!(sent[0].formatted.contains("Content-Type: text/plain"));
    assert!(sent[0].formatted.contains("Ridge Fire was created."));
}

#[tokio::test]
async fn test_simple_email_accepts_recipient_array() {
    let (mailer, dispatcher) = setup();

    let report = dispatcher
        .dispatch(
            r#"{"to": ["a@example.org", "broken", "b@example.org"], "from": "nics@example.org", "subject": "s", "body": "b"}"#,
        )
        .await;

    assert_eq!(report.outcome, DispatchOutcome::Sent { recipients: 2 });
    assert_eq!(
        mailer.sent_messages().await[0].recipients,
        vec!["a@example.org".to_string(), "b@example.org".to_string()]
    );
}

#[tokio::test]
async fn test_xml_email_with_embedded_image() {
    let (mailer, dispatcher) = setup();

    let report = dispatcher
        .dispatch(
            r#"<email>
  <header>
    <from>nics@example.org</from>
    <to>a@example.org</to>
    <cc>c@example.org, not-valid</cc>
    <subject>Map snapshot</subject>
  </header>
  <content>
    <body><format>html</format><text>&lt;html&gt;&lt;body&gt;&lt;p&gt;Perimeter&lt;/p&gt;&lt;/body&gt;&lt;/html&gt;</text></body>
    <image><location>embed</location><JPEGPicture>/9j/4AE=</JPEGPicture></image>
  </content>
</email>"#,
        )
        .await;

    assert_eq!(report.kind, EmailKind::Xml);
    assert_eq!(report.outcome, DispatchOutcome::Sent { recipients: 2 });

    let sent = &mailer.sent_messages().await[0];
    assert_eq!(
        sent.recipients,
        vec!["a@example.org".to_string(), "c@example.org".to_string()]
    );
    assert!(sent.formatted.contains("multipart/related"));
    assert!(sent.formatted.contains("Content-ID: <embedded_image>"));
    assert!(sent.formatted.contains("cid:embedded_image"));
}

#[tokio::test]
async fn test_xml_email_with_attachment() {
    let (mailer, dispatcher) = setup();

    let report = dispatcher
        .dispatch(
            r#"<email>
  <header><from>nics@example.org</from><to>a@example.org</to><subject>Report</subject></header>
  <content>
    <body><text>See attached.</text></body>
    <image><location>bottom</location><JPEGPicture>/9j/4AE=</JPEGPicture></image>
  </content>
</email>"#,
        )
        .await;

    assert_eq!(report.outcome, DispatchOutcome::Sent { recipients: 1 });
    let sent = &mailer.sent_messages().await[0];
    assert!(sent.formatted.contains("multipart/mixed"));
    assert!(sent.formatted.contains(ATTACHED_IMAGE_NAME));
    assert!(sent.formatted.contains("See attached."));
}

#[tokio::test]
async fn test_xml_email_without_valid_recipients_is_not_sent() {
    let (mailer, dispatcher) = setup();

    let report = dispatcher
        .dispatch(
            r#"<email>
  <header><from>nics@example.org</from><to>nobody</to><cc>c@example.org</cc><subject>s</subject></header>
  <content><body><text>t</text></body></content>
</email>"#,
        )
        .await;

    assert_eq!(report.outcome, DispatchOutcome::NoRecipients);
    assert!(mailer.sent_messages().await.is_empty());
}

#[tokio::test]
async fn test_failure_does_not_block_next_message() {
    let (mailer, dispatcher) = setup();
    mailer.fail_next("421 service not available").await;

    let first = dispatcher
        .dispatch(&fixtures::simple_email("a@example.org", "one", "1"))
        .await;
    let second = dispatcher
        .dispatch(&fixtures::simple_email("a@example.org", "two", "2"))
        .await;

    assert!(matches!(first.outcome, DispatchOutcome::Failed { .. }));
    assert_eq!(second.outcome, DispatchOutcome::Sent { recipients: 1 });
    assert_eq!(mailer.sent_messages().await.len(), 1);
}
