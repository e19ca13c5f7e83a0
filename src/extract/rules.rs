//! The declarative extraction rule table.
//!
//! ## Why a table?
//!
//! The source payslips have no fixed layout: labels and values move around
//! between payroll-software versions, and the PDF text layer arrives either
//! in standard Persian spelling or in reshaped Arabic presentation forms
//! depending on the generator. A table of independent per-field rules —
//! anchor keywords plus one capture pattern — tolerates reordered and
//! missing lines, and adding a field never touches the engine.
//!
//! Each anchor list carries *both* spellings of its label (standard and
//! presentation-form) because NFC normalization deliberately leaves
//! compatibility characters alone (see [`crate::extract::normalize`]).
//!
//! The one layout assumption that cannot be expressed as a keyword rule is
//! the document header: name and family name are identified purely by
//! position. That assumption is load-bearing and fragile, so it lives here
//! as the named [`HEADER`] rule with explicit line indices rather than as
//! hard-coded offsets inside the engine — a new layout means a new
//! `HeaderRule`, not an engine change.

use crate::record::PayslipRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// Which lines a rule may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Scan every line; the first match wins.
    AllLines,
    /// Match only the very first line of the document.
    FirstLineOnly,
}

/// Positional header rule: best-effort extraction of name and family name
/// from fixed line positions.
#[derive(Debug, Clone, Copy)]
pub struct HeaderRule {
    /// Minimum number of lines required for the header layout to apply.
    pub min_lines: usize,
    /// Zero-based index of the line holding `<name><separator>…`.
    pub name_line: usize,
    /// Separator ending the personal name on the name line.
    pub separator: char,
    /// Zero-based index of the line holding the family name.
    pub family_line: usize,
}

/// The header layout observed in the source payslips: line 1 is
/// `<name>:` and line 2 is the family name. When the separator is absent
/// the rule does not apply and both fields stay empty.
pub const HEADER: HeaderRule = HeaderRule {
    min_lines: 3,
    name_line: 1,
    separator: ':',
    family_line: 2,
};

/// One keyword-anchored extraction rule.
pub struct FieldRule {
    /// Field name, for logging only.
    pub name: &'static str,
    /// A line must contain one of these to be considered. An empty list
    /// means the capture pattern alone decides.
    pub anchors: &'static [&'static str],
    /// Capture pattern; group 1 is the value.
    pub pattern: Regex,
    /// Strip grouping separators and fold Persian digits in the captured value.
    pub numeric: bool,
    pub scope: Scope,
    /// Writes the captured value into the record.
    pub assign: fn(&mut PayslipRecord, String),
}

fn rule(
    name: &'static str,
    anchors: &'static [&'static str],
    pattern: &str,
    numeric: bool,
    scope: Scope,
    assign: fn(&mut PayslipRecord, String),
) -> FieldRule {
    FieldRule {
        name,
        anchors,
        pattern: Regex::new(pattern).unwrap(),
        numeric,
        scope,
        assign,
    }
}

/// Arabic block plus presentation-form blocks plus whitespace — the
/// character class for captured Persian phrases in either spelling.
const PERSIAN_PHRASE: &str = r"[\x{0600}-\x{06FF}\x{FB50}-\x{FDFF}\x{FE70}-\x{FEFF}\s]+";

/// The full rule table, in application order.
pub static RULES: Lazy<Vec<FieldRule>> = Lazy::new(|| {
    vec![
        rule(
            "national_id",
            &["کد ملی", "ﮐﺪ ﻣﻠﯽ"],
            r"(\d{10})",
            true,
            Scope::AllLines,
            |r, v| r.national_id = Some(v),
        ),
        rule(
            "personnel_number",
            &["پرسنلی", "ﭘﺮﺳﻨﻠﯽ"],
            r"(\d+)",
            true,
            Scope::AllLines,
            |r, v| r.personnel_number = Some(v),
        ),
        rule(
            "insurance_number",
            &["بیمه", "ﺑﯿﻤﻪ"],
            r"(\d+)",
            true,
            Scope::AllLines,
            |r, v| r.insurance_number = Some(v),
        ),
        rule(
            "employer",
            &["شرکت", "ﺷﺮﮐﺖ"],
            // The employer name follows the word "company" in either spelling.
            &format!(r"(?:شرکت|ﺷﺮﮐﺖ)\s+({PERSIAN_PHRASE})"),
            false,
            Scope::AllLines,
            |r, v| r.employer = Some(v),
        ),
        rule(
            "year",
            &[],
            r"^(\d{4})$",
            true,
            Scope::FirstLineOnly,
            |r, v| r.year = Some(v),
        ),
        rule(
            "month",
            &[
                "فروردین", "اردیبهشت", "خرداد", "تیر", "مرداد", "شهریور", "مهر", "آبان",
                "آذر", "دی", "بهمن", "اسفند", "ﺑﻬﻤﻦ",
            ],
            // Word boundaries keep short names (دی, مهر) from matching
            // inside longer words on unrelated lines.
            r"\b(فروردین|اردیبهشت|خرداد|تیر|مرداد|شهریور|مهر|آبان|آذر|دی|بهمن|اسفند|ﺑﻬﻤﻦ)\b",
            false,
            Scope::AllLines,
            |r, v| r.month = Some(v),
        ),
        rule(
            "working_days",
            &["کارکرد عادی", "ﮐﺎﺭﮐﺮﺩ ﻋﺎﺩﯼ"],
            r"(\d+[/.]\d+|\d+)",
            true,
            Scope::AllLines,
            |r, v| r.working_days = Some(v),
        ),
        rule(
            "base_salary",
            &["حقوق پایه", "ﺣﻘﻮﻕ ﭘﺎﯾﻪ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.base_salary = Some(v),
        ),
        rule(
            "housing_allowance",
            &["حق مسکن", "ﺣﻖ ﻣﺴﮑﻦ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.housing_allowance = Some(v),
        ),
        rule(
            "food_allowance",
            &["خواروبار", "ﺧﻮﺍﺭﻭﺑﺎﺭ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.food_allowance = Some(v),
        ),
        rule(
            "gross_salary",
            &["حقوق و مزایا", "ﺣﻘﻮﻕ ﻭ ﻣﺰﺍﯾﺎ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.gross_salary = Some(v),
        ),
        rule(
            "employee_insurance",
            &["بیمه سهم کارمند", "ﺑﯿﻤﻪ ﺳﻬﻢ ﮐﺎﺭﻣﻨﺪ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.employee_insurance = Some(v),
        ),
        rule(
            "food_expense",
            &["هزینه غذا", "ﻫﺰﯾﻨﻪ ﻏﺬﺍ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.food_expense = Some(v),
        ),
        rule(
            "total_deductions",
            &["جمع کسور", "ﺟﻤﻊ ﮐﺴﻮﺭ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.total_deductions = Some(v),
        ),
        rule(
            "net_payment",
            &["خالص پرداختی", "ﺧﺎﻟﺺ ﭘﺮﺩﺍﺧﺘﯽ"],
            r"([\d,]+)",
            true,
            Scope::AllLines,
            |r, v| r.net_payment = Some(v),
        ),
        rule(
            "net_payment_text",
            &["خالص پرداختی", "ﺧﺎﻟﺺ ﭘﺮﺩﺍﺧﺘﯽ"],
            // The amount in words follows the figure on the same line. The
            // capture must not start with a digit or separator, or the
            // pattern would backtrack into the figure itself.
            r"[\d,]+\s*([^\d,\s][^\n\r]*)",
            false,
            Scope::AllLines,
            |r, v| r.net_payment_text = Some(v),
        ),
    ]
});
