/// Result of comparing the typed text against the passage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub accuracy: f64,
    pub progress: f64,
    pub is_complete: bool,
}

/// Compare `typed` against `passage`, char by char.
///
/// Characters typed past the end of the passage count towards `typed`'s
/// length but are never compared, so over-typing does not lower accuracy.
pub fn update(passage: &str, typed: &str) -> ProgressUpdate {
    let passage_len = passage.chars().count();
    let typed_len = typed.chars().count();

    let matches = typed
        .chars()
        .zip(passage.chars())
        .filter(|(t, p)| t == p)
        .count();

    let accuracy = if typed_len == 0 {
        100.0
    } else {
        (matches as f64 / typed_len as f64) * 100.0
    };

    let progress = if passage_len == 0 {
        100.0
    } else {
        ((typed_len as f64 / passage_len as f64) * 100.0).min(100.0)
    };

    ProgressUpdate {
        accuracy,
        progress,
        is_complete: typed == passage,
    }
}
