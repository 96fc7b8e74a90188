//! Lexer diagnostic codes (spec.md §4.1).

use l0_util::DiagnosticCode;

pub const LEX_UNTERMINATED_STRING: DiagnosticCode = DiagnosticCode::new("LEX", 10);
pub const LEX_EMPTY_BYTE_LITERAL: DiagnosticCode = DiagnosticCode::new("LEX", 20);
pub const LEX_UNTERMINATED_BYTE_LITERAL: DiagnosticCode = DiagnosticCode::new("LEX", 21);
pub const LEX_NON_ASCII_BYTE_LITERAL: DiagnosticCode = DiagnosticCode::new("LEX", 30);
pub const LEX_UNKNOWN_CHARACTER: DiagnosticCode = DiagnosticCode::new("LEX", 40);
pub const LEX_UNKNOWN_ESCAPE: DiagnosticCode = DiagnosticCode::new("LEX", 50);
pub const LEX_INVALID_HEX_ESCAPE: DiagnosticCode = DiagnosticCode::new("LEX", 51);
pub const LEX_INCOMPLETE_ESCAPE: DiagnosticCode = DiagnosticCode::new("LEX", 52);
pub const LEX_ESCAPE_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new("LEX", 53);
pub const LEX_ESCAPE_DECODE_FAILED: DiagnosticCode = DiagnosticCode::new("LEX", 59);
pub const LEX_INTEGER_OVERFLOW: DiagnosticCode = DiagnosticCode::new("LEX", 60);
pub const LEX_MALFORMED_DIGIT_RUN: DiagnosticCode = DiagnosticCode::new("LEX", 61);
pub const LEX_UNTERMINATED_BLOCK_COMMENT: DiagnosticCode = DiagnosticCode::new("LEX", 70);
