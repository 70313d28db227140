//! End-to-end: template -> session -> attachments -> encoded payload

use std::rc::Rc;

use form_attachments::{
    AttachmentPolicy, FormSession, MemoryFile, MemoryPreviewStore, SubmissionError,
};
use form_compiler::compile_template;
use form_types::{FieldValue, FileHandle, RawField, RawTemplate};
use pretty_assertions::assert_eq;

const MIB: usize = 1024 * 1024;

fn site_visit() -> RawTemplate {
    RawTemplate::new(
        "F-7",
        "Site Visit",
        vec![
            RawField::new("visited_at", "Visited At", "datetime")
                .in_category("Visit", 1, 1)
                .required(),
            RawField::new("crew", "Crew Size", "numberInt")
                .in_category("Visit", 1, 2)
                .with_default("4"),
            RawField::new("hazard", "Hazard Found", "text")
                .in_category("Safety", 2, 1)
                .with_comment("hazard_notes")
                .with_photo(),
            RawField::new("site_photos", "Site Photos", "photo").in_category("Safety", 2, 2),
            RawField::new("permit", "Permit", "file").in_category("Safety", 2, 3),
        ],
    )
}

fn session() -> (FormSession, Rc<MemoryPreviewStore>) {
    let form = compile_template(&site_visit()).unwrap();
    let store = Rc::new(MemoryPreviewStore::new());
    let session = FormSession::new(form, AttachmentPolicy::default(), store.clone());
    (session, store)
}

fn png(name: &str, size: usize) -> FileHandle {
    MemoryFile::sized(name, "image/png", size).into_handle()
}

#[test]
fn test_defaults_seed_values() {
    let (session, _store) = session();
    assert_eq!(session.value("crew"), Some(&FieldValue::Number(4.0)));
    assert_eq!(session.value("visited_at"), Some(&FieldValue::Null));
    assert_eq!(session.value("hazard_photo"), Some(&FieldValue::Null));
}

#[test]
fn test_ten_megabyte_image_rejected() {
    let (mut session, store) = session();
    assert!(session.select_files("site_photos", vec![png("huge.png", 10 * MIB)]).is_err());

    assert_eq!(session.errors().len(), 1);
    assert_eq!(session.errors()[0].field, "site_photos");
    assert_eq!(session.errors()[0].message, "Images only and each < 5 MB");
    assert!(session.previews("site_photos").is_empty());
    assert_eq!(store.live_count(), 0);
}

#[test]
fn test_batch_with_non_image_rejected() {
    let (mut session, store) = session();
    let doc = MemoryFile::sized("spec.docx", "application/msword", 3 * MIB).into_handle();
    assert!(session.select_files("site_photos", vec![png("ok.png", 2 * MIB), doc]).is_err());

    assert_eq!(session.value("site_photos"), Some(&FieldValue::Null));
    assert_eq!(store.live_count(), 0);
}

#[test]
fn test_every_release_path_returns_live_count_to_zero() {
    let (mut session, store) = session();
    session.set_value("hazard", FieldValue::from("Loose rail"));
    session.select_files("site_photos", vec![png("a.png", 8), png("b.png", 8)]).unwrap();
    session.select_files("hazard_photo", vec![png("h.png", 8)]).unwrap();
    session.select_files("permit", vec![MemoryFile::sized("p.pdf", "application/pdf", 8).into_handle()]).unwrap();
    assert_eq!(store.live_count(), 4);

    let first = session.previews("site_photos")[0].id.clone();
    assert!(session.remove_attachment("site_photos", &first));
    assert_eq!(store.live_count(), 3);

    assert!(session.clear_attachments("permit"));
    assert_eq!(store.live_count(), 2);

    session.reset();
    assert_eq!(store.live_count(), 0);
    assert_eq!(session.value("crew"), Some(&FieldValue::Number(4.0)));
}

#[test]
fn test_dropping_session_releases_previews() {
    let (mut session, store) = session();
    session.select_files("site_photos", vec![png("a.png", 8)]).unwrap();
    drop(session);
    assert_eq!(store.live_count(), 0);
}

#[tokio::test]
async fn test_submit_payload_shape() {
    let (mut session, _store) = session();
    session.set_value("visited_at", FieldValue::from("2024-01-15T09:30"));
    session.set_value("hazard", FieldValue::from("None"));
    let note = MemoryFile::new("a.txt", "text/plain", b"hello world\n".to_vec())
        .modified_at(1_705_311_000_000)
        .into_handle();
    session.select_files("permit", vec![note]).unwrap();
    session.select_files("site_photos", vec![png("1.png", 4), png("2.png", 4)]).unwrap();

    let payload = session.submit().await.unwrap();
    let keys: Vec<_> = payload.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["visited_at", "crew", "hazard", "hazard_notes", "hazard_photo", "site_photos", "permit"]
    );
    assert_eq!(
        payload["permit"],
        serde_json::json!({
            "name": "a.txt",
            "size": 12,
            "type": "text/plain",
            "lastModified": "2024-01-15T09:30:00.000Z",
            "dataUrl": "data:text/plain;base64,aGVsbG8gd29ybGQK"
        })
    );
    assert_eq!(payload["site_photos"].as_array().map(Vec::len), Some(2));
    assert!(!session.is_disabled());
}

#[tokio::test]
async fn test_bad_datetime_blocks_submission() {
    let (mut session, _store) = session();
    session.set_value("visited_at", FieldValue::from("not-a-date"));

    match session.submit().await {
        Err(SubmissionError::Invalid(report)) => {
            assert_eq!(report.errors.len(), 1);
            assert_eq!(report.errors[0].field, "visited_at");
        }
        other => panic!("expected invalid submission, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_file_fails_whole_submission() {
    let (mut session, _store) = session();
    session.set_value("visited_at", FieldValue::from("2024-01-15T09:30"));
    let broken = MemoryFile::sized("gone.png", "image/png", 4).failing_reads().into_handle();
    session.select_files("site_photos", vec![png("ok.png", 4), broken]).unwrap();

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SubmissionError::Read(ref e) if e.name == "gone.png"));
}

#[tokio::test]
async fn test_reset_during_encoding_supersedes() {
    let (mut session, _store) = session();
    session.set_value("visited_at", FieldValue::from("2024-01-15T09:30"));

    let ticket = session.begin_submit().unwrap();
    let payload = form_attachments::encode_submission(ticket.values()).await;
    session.reset();

    assert_eq!(
        session.complete_submit(ticket, payload),
        Err(SubmissionError::Superseded)
    );
}
