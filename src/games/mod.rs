//! The two games that share the session synchronizer.
//!
//! | Game                   | Submission | Sends                 |
//! |------------------------|------------|-----------------------|
//! | [`NumberGuesser`]      | `i64`      | `PLAYER_TURN`, `REPLAY` |
//! | [`RockPaperScissors`]  | [`Pick`]   | `GAME`, `RESET`       |

pub mod number_guesser;
pub mod rock_paper_scissors;

pub use number_guesser::{GuessRange, NumberGuesser};
pub use rock_paper_scissors::{Pick, RockPaperScissors};
