/// JSON token reports for inspection.
pub mod dump;
/// Parser stack frame.
pub mod level;
/// Two-phase tokenizer.
pub mod lexer;
/// Token annotation state machine.
pub mod parser;
/// Token and mark types.
pub mod token;
