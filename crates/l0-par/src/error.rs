//! `PAR-NNNN` diagnostic codes (spec.md §4.2).

use l0_util::DiagnosticCode;

macro_rules! par_codes {
    ($($name:ident = $num:expr;)*) => {
        $(pub const $name: DiagnosticCode = DiagnosticCode::new("PAR", $num);)*
    };
}

par_codes! {
    PAR_RESERVED_LET_NAME = 10;
    PAR_RESERVED_PARAM_NAME = 11;
    PAR_EXPECTED_MODULE_HEADER = 20;
    PAR_EXPECTED_IMPORT_PATH = 30;
    PAR_EXPECTED_ITEM = 40;
    PAR_EMPTY_STRUCT = 41;
    PAR_EXPECTED_FIELD_SEMI = 42;
    PAR_EMPTY_ENUM = 43;
    PAR_EXPECTED_VARIANT_NAME = 44;
    PAR_EXPECTED_ALIAS_TYPE = 45;
    PAR_EXPECTED_ALIAS_EQ = 46;
    PAR_EXPECTED_FN_NAME = 50;
    PAR_EXPECTED_PARAM_LPAREN = 51;
    PAR_EXPECTED_PARAM_NAME = 52;
    PAR_EXPECTED_PARAM_COLON = 53;
    PAR_EXPECTED_PARAM_TYPE = 54;
    PAR_EXPECTED_PARAM_RPAREN = 55;
    PAR_EXPECTED_FN_BODY_OR_SEMI = 56;
    PAR_EXPECTED_TYPE = 60;
    PAR_EXPECTED_TYPE_NAME = 61;
    PAR_EXPECTED_BLOCK_LBRACE = 70;
    PAR_EXPECTED_BLOCK_RBRACE = 71;
    PAR_EXPECTED_STMT = 72;
    PAR_EXPECTED_STMT_SEMI = 73;
    PAR_EXPECTED_LET_NAME = 80;
    PAR_EXPECTED_LET_INIT = 81;
    PAR_EXPECTED_ASSIGN_TARGET = 90;
    PAR_EXPECTED_ASSIGN_EQ = 91;
    PAR_EXPECTED_EXPR_STMT_SEMI = 100;
    PAR_EXPECTED_IF_COND = 110;
    PAR_EXPECTED_IF_LPAREN = 111;
    PAR_EXPECTED_IF_RPAREN = 112;
    PAR_EXPECTED_WHILE_LPAREN = 120;
    PAR_EXPECTED_WHILE_RPAREN = 121;
    PAR_EXPECTED_WHILE_COND = 122;
    PAR_EXPECTED_FOR_LPAREN = 130;
    PAR_EXPECTED_FOR_SEMI = 131;
    PAR_EXPECTED_FOR_RPAREN = 132;
    PAR_EXPECTED_MATCH_LPAREN = 140;
    PAR_EXPECTED_MATCH_RPAREN = 141;
    PAR_EMPTY_MATCH = 142;
    PAR_EXPECTED_MATCH_FATARROW = 143;
    PAR_EXPECTED_MATCH_ARM_BODY = 144;
    PAR_EXPECTED_CASE_ARM = 150;
    PAR_EXPECTED_CASE_LPAREN = 160;
    PAR_EXPECTED_CASE_RPAREN = 161;
    PAR_EXPECTED_WITH_LPAREN = 170;
    PAR_EXPECTED_WITH_NAME = 171;
    PAR_EXPECTED_WITH_EQ = 172;
    PAR_EXPECTED_WITH_RPAREN = 173;
    PAR_EXPECTED_DROP_NAME = 174;
    PAR_EXPECTED_BREAK_SEMI = 175;
    PAR_EXPECTED_CONTINUE_SEMI = 176;
    PAR_EXPECTED_RETURN_SEMI = 177;
    PAR_EXPECTED_PRIMARY_EXPR = 180;
    PAR_EXPECTED_RPAREN_AFTER_EXPR = 181;
    PAR_OVERQUALIFIED_PATH = 182;
    PAR_EXPECTED_CALL_RPAREN = 190;
    PAR_RESERVED_ARRAY_INDEX = 200;
    PAR_EXPECTED_FIELD_NAME = 210;
    PAR_EXPECTED_CAST_TYPE = 211;
    PAR_UNEXPECTED_TOKEN = 212;
    PAR_RESERVED_PUNCTUATION = 226;
    PAR_EXPECTED_NEW_TYPE = 300;
    PAR_EXPECTED_NEW_RPAREN = 310;
    PAR_EXPECTED_SIZEOF_RPAREN = 311;
    PAR_EXPECTED_ORD_RPAREN = 312;
    PAR_EXPECTED_INTRINSIC_LPAREN = 320;
    PAR_EXPECTED_EOF = 321;
    PAR_TOO_MANY_ERRORS = 400;
    PAR_ARRAY_TYPE_RESERVED = 9401;
}
