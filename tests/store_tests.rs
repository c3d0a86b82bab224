// Integration tests for the entry store: field-scoped recording updates and
// the compare-and-set processing transition.

use anyhow::Result;
use logbook_transcribe::{
    AudioRecording, EntryStore, LogEntry, MemoryEntryStore, RecordingPatch, StoreError,
    TranscriptionStatus,
};
use uuid::Uuid;

fn recording(name: &str) -> AudioRecording {
    AudioRecording::new(format!("e/{name}"), name.to_string(), 100, None)
}

async fn seed_entry_with_recordings(
    store: &MemoryEntryStore,
    count: usize,
) -> Result<(Uuid, Vec<Uuid>)> {
    let entry = LogEntry::new("clinic-1".to_string(), None);
    let entry_id = entry.id;
    store.insert_entry(entry).await?;

    let mut ids = Vec::new();
    for i in 0..count {
        let rec = recording(&format!("clip-{i}.mp3"));
        ids.push(rec.id);
        store.append_recording(entry_id, rec).await?;
    }
    Ok((entry_id, ids))
}

#[tokio::test]
async fn patch_touches_only_the_addressed_recording() -> Result<()> {
    let store = MemoryEntryStore::new();
    let (entry_id, ids) = seed_entry_with_recordings(&store, 3).await?;

    let before = store.get_entry(entry_id).await?;

    store
        .update_recording(
            entry_id,
            ids[1],
            RecordingPatch::completed("middle transcript".to_string()),
        )
        .await?;

    let after = store.get_entry(entry_id).await?;

    // Sibling recordings are byte-identical to their pre-patch state.
    for idx in [0, 2] {
        let was = serde_json::to_value(&before.recordings[idx])?;
        let now = serde_json::to_value(&after.recordings[idx])?;
        assert_eq!(was, now, "recording {idx} must be untouched");
    }

    let target = after.recording(ids[1]).unwrap();
    assert_eq!(target.transcription_status, TranscriptionStatus::Completed);
    assert_eq!(target.transcript.as_deref(), Some("middle transcript"));
    Ok(())
}

#[tokio::test]
async fn begin_transcription_rejects_a_second_caller() -> Result<()> {
    let store = MemoryEntryStore::new();
    let (entry_id, ids) = seed_entry_with_recordings(&store, 1).await?;

    store.begin_transcription(entry_id, ids[0]).await?;
    let err = store.begin_transcription(entry_id, ids[0]).await.unwrap_err();
    assert!(matches!(err, StoreError::AlreadyInProgress(id) if id == ids[0]));

    // A terminal transition re-arms the guard.
    store
        .update_recording(entry_id, ids[0], RecordingPatch::failed("gave up"))
        .await?;
    store.begin_transcription(entry_id, ids[0]).await?;
    Ok(())
}

#[tokio::test]
async fn unknown_ids_surface_as_not_found() -> Result<()> {
    let store = MemoryEntryStore::new();
    let (entry_id, _) = seed_entry_with_recordings(&store, 1).await?;

    let missing_entry = Uuid::new_v4();
    assert!(matches!(
        store.get_entry(missing_entry).await.unwrap_err(),
        StoreError::EntryNotFound(id) if id == missing_entry
    ));

    let missing_recording = Uuid::new_v4();
    assert!(matches!(
        store
            .update_recording(entry_id, missing_recording, RecordingPatch::processing())
            .await
            .unwrap_err(),
        StoreError::RecordingNotFound { recording_id, .. } if recording_id == missing_recording
    ));
    Ok(())
}

#[tokio::test]
async fn recordings_keep_insertion_order() -> Result<()> {
    let store = MemoryEntryStore::new();
    let (entry_id, ids) = seed_entry_with_recordings(&store, 3).await?;

    let entry = store.get_entry(entry_id).await?;
    let stored: Vec<Uuid> = entry.recordings.iter().map(|r| r.id).collect();
    assert_eq!(stored, ids);
    Ok(())
}
