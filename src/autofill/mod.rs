pub mod matching;
pub mod reconciler;
