pub mod card;
pub mod history;
pub mod pool;
pub mod selection;

pub use card::{CardId, HeroCard, HeroId};
pub use history::{MAX_SERIES_LEN, ScoreHistory};
pub use pool::CardPool;
pub use selection::DraftSelection;
