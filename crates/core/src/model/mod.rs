mod ids;
mod session;
mod word;
mod word_list;

pub use ids::{TestResultId, WordListId};
pub use session::{AttemptRecord, ResultDetails, SessionWord, TestResult, TestResultError};
pub use word::Word;
pub use word_list::{WordList, WordListDraft, WordListError, parse_words};
