use super::*;

#[test]
fn in_memory_read_returns_content() {
    let mut io = InMemoryFile::with_content("<svg/>");
    assert_eq!(io.read_text_file().unwrap(), "<svg/>");
}

#[test]
fn in_memory_read_without_content_fails() {
    let mut io = InMemoryFile::default();
    assert!(matches!(io.read_text_file(), Err(ViewerError::ReadFailure(_))));
}

#[test]
fn in_memory_write_records_document() {
    let mut io = InMemoryFile::default();
    assert_eq!(io.write_text_file("a").unwrap(), SaveOutcome::Saved);
    assert_eq!(io.write_text_file("b").unwrap(), SaveOutcome::Saved);
    assert_eq!(io.written, vec!["a".to_owned(), "b".to_owned()]);
}

#[test]
fn in_memory_declined_write_records_nothing() {
    let mut io = InMemoryFile { decline_writes: true, ..InMemoryFile::default() };
    assert_eq!(io.write_text_file("a").unwrap(), SaveOutcome::Declined);
    assert!(io.written.is_empty());
}
