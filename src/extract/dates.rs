//! Due-date recognition.
//!
//! Only explicit time references count. Each is resolved to a calendar
//! date against a reference date; when several appear, the first one in
//! the text wins.

use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate, Weekday};
use regex::{Captures, Regex};

/// Preposition that may precede a date phrase. Stripped with it.
const PREP: &str = r"(?:\b(?:by|on|before|until|till|due(?:\s+(?:on|by))?|no later than)\s+)?";

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

const WEEKDAY: &str = r"(monday|tuesday|wednesday|thursday|friday|saturday|sunday)";

#[derive(Debug, Clone, Copy)]
enum Rule {
    Iso,
    Us,
    MonthDay,
    DayMonth,
    Today,
    Tomorrow,
    NextWeekday,
    Weekday,
    EndOfWeek,
    NextWeek,
    EndOfMonth,
    NextMonth,
    InN,
}

struct DatePattern {
    rule: Rule,
    regex: Regex,
}

fn pattern(rule: Rule, core: &[&str]) -> DatePattern {
    let source = format!("(?i){PREP}{}", core.concat());
    DatePattern {
        rule,
        regex: Regex::new(&source).expect("date pattern must compile"),
    }
}

static PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        pattern(Rule::Iso, &[r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b"]),
        pattern(Rule::Us, &[r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"]),
        pattern(
            Rule::MonthDay,
            &[r"\b", MONTH, r"\.?\s+(\d{1,2})(?:st|nd|rd|th)?\b(?:,?\s+(\d{4})\b)?"],
        ),
        pattern(
            Rule::DayMonth,
            &[r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?", MONTH, r"\b(?:,?\s+(\d{4})\b)?"],
        ),
        pattern(
            Rule::Today,
            &[r"\b(?:today|tonight|end\s+of\s+(?:the\s+)?day|eod|close\s+of\s+business|cob)\b"],
        ),
        pattern(Rule::Tomorrow, &[r"\b(?:tomorrow|tmrw)\b"]),
        pattern(Rule::NextWeekday, &[r"\bnext\s+", WEEKDAY, r"\b"]),
        pattern(Rule::Weekday, &[r"\b(?:this\s+|coming\s+)?", WEEKDAY, r"\b"]),
        pattern(
            Rule::EndOfWeek,
            &[r"\b(?:(?:the\s+)?end\s+of\s+(?:the\s+|this\s+)?week|eow|this\s+week)\b"],
        ),
        pattern(Rule::NextWeek, &[r"\bnext\s+week\b"]),
        pattern(
            Rule::EndOfMonth,
            &[r"\b(?:(?:the\s+)?end\s+of\s+(?:the\s+|this\s+)?month|eom)\b"],
        ),
        pattern(Rule::NextMonth, &[r"\bnext\s+month\b"]),
        pattern(
            Rule::InN,
            &[r"\bin\s+(\d{1,3}|an?|one|two|three|four|five|six|seven|eight|nine|ten)\s+(day|week)s?\b"],
        ),
    ]
});

struct DateMatch<'t> {
    start: usize,
    end: usize,
    rule: Rule,
    caps: Captures<'t>,
}

/// All date phrases in `text`, earliest first, longer first on ties.
fn scan(text: &str) -> Vec<DateMatch<'_>> {
    let mut found: Vec<DateMatch<'_>> = PATTERNS
        .iter()
        .flat_map(|p| {
            p.regex.captures_iter(text).filter_map(move |caps| {
                let whole = caps.get(0)?;
                // "today's standup" names a meeting, not a deadline.
                let rest = &text[whole.end()..];
                if rest.starts_with('\'') || rest.starts_with('\u{2019}') {
                    return None;
                }
                Some(DateMatch {
                    start: whole.start(),
                    end: whole.end(),
                    rule: p.rule,
                    caps,
                })
            })
        })
        .collect();
    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    found
}

/// First resolvable due date in `text`, or `None` when there is no
/// explicit time reference.
pub fn find_due_date(text: &str, reference: NaiveDate) -> Option<NaiveDate> {
    scan(text)
        .into_iter()
        .find_map(|m| resolve(m.rule, &m.caps, reference))
}

/// `text` with every date phrase (and its preposition) removed.
pub fn strip_date_phrases(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for m in scan(text).into_iter().filter(names_real_date) {
        if m.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..m.start]);
        cursor = m.end;
    }
    out.push_str(&text[cursor..]);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a matched phrase resolves at all. Validity does not depend on
/// the reference date.
fn names_real_date(m: &DateMatch<'_>) -> bool {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|reference| resolve(m.rule, &m.caps, reference))
        .is_some()
}

fn resolve(rule: Rule, caps: &Captures<'_>, reference: NaiveDate) -> Option<NaiveDate> {
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let text = |i: usize| caps.get(i).map(|m| m.as_str().to_ascii_lowercase());

    match rule {
        Rule::Iso => NaiveDate::from_ymd_opt(num(1)? as i32, num(2)?, num(3)?),
        Rule::Us => NaiveDate::from_ymd_opt(num(3)? as i32, num(1)?, num(2)?),
        Rule::MonthDay => {
            let month = month_number(&text(1)?)?;
            dated(reference, month, num(2)?, num(3))
        }
        Rule::DayMonth => {
            let month = month_number(&text(2)?)?;
            dated(reference, month, num(1)?, num(3))
        }
        Rule::Today => Some(reference),
        Rule::Tomorrow => reference.checked_add_days(Days::new(1)),
        Rule::NextWeekday => {
            let target = weekday(&text(1)?)?;
            next_monday(reference)?
                .checked_add_days(Days::new(u64::from(target.num_days_from_monday())))
        }
        Rule::Weekday => {
            let target = weekday(&text(1)?)?;
            reference.checked_add_days(Days::new(days_until(reference, target)))
        }
        Rule::EndOfWeek => {
            reference.checked_add_days(Days::new(days_until(reference, Weekday::Fri)))
        }
        Rule::NextWeek => next_monday(reference),
        Rule::EndOfMonth => first_of_next_month(reference)?.pred_opt(),
        Rule::NextMonth => first_of_next_month(reference),
        Rule::InN => {
            let count = match text(1)?.as_str() {
                "a" | "an" | "one" => 1,
                "two" => 2,
                "three" => 3,
                "four" => 4,
                "five" => 5,
                "six" => 6,
                "seven" => 7,
                "eight" => 8,
                "nine" => 9,
                "ten" => 10,
                digits => digits.parse().ok()?,
            };
            let unit = if text(2)?.as_str() == "week" { 7 } else { 1 };
            reference.checked_add_days(Days::new(count * unit))
        }
    }
}

/// Explicit year wins; otherwise the next occurrence on or after `reference`.
fn dated(reference: NaiveDate, month: u32, day: u32, year: Option<u32>) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year as i32, month, day);
    }
    // Feb 29 can be up to eight years out across a skipped leap year.
    (reference.year()..=reference.year() + 8)
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .find(|date| *date >= reference)
}

/// Days from `reference` to the nearest `target` on or after it.
fn days_until(reference: NaiveDate, target: Weekday) -> u64 {
    let from = reference.weekday().num_days_from_monday();
    let to = target.num_days_from_monday();
    u64::from((to + 7 - from) % 7)
}

/// Monday of the calendar week after `reference`.
fn next_monday(reference: NaiveDate) -> Option<NaiveDate> {
    let since_monday = u64::from(reference.weekday().num_days_from_monday());
    reference.checked_add_days(Days::new(7 - since_monday))
}

fn first_of_next_month(reference: NaiveDate) -> Option<NaiveDate> {
    if reference.month() == 12 {
        NaiveDate::from_ymd_opt(reference.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(reference.year(), reference.month() + 1, 1)
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn weekday(name: &str) -> Option<Weekday> {
    name.parse::<Weekday>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn due(text: &str) -> Option<NaiveDate> {
        find_due_date(text, monday())
    }

    #[test]
    fn weekday_resolves_to_upcoming() {
        assert_eq!(due("Ship it by Friday"), Some(date(2024, 6, 7)));
        assert_eq!(due("on Monday"), Some(date(2024, 6, 3)));
        assert_eq!(due("before this Sunday"), Some(date(2024, 6, 9)));
    }

    #[test]
    fn next_weekday_lands_in_following_week() {
        assert_eq!(due("by next Friday"), Some(date(2024, 6, 14)));
        assert_eq!(due("next Monday"), Some(date(2024, 6, 10)));
        let friday = date(2024, 6, 7);
        assert_eq!(find_due_date("next Friday", friday), Some(date(2024, 6, 14)));
        assert_eq!(find_due_date("next Monday", friday), Some(date(2024, 6, 10)));
    }

    #[test]
    fn relative_days() {
        assert_eq!(due("do it today"), Some(monday()));
        assert_eq!(due("by EOD"), Some(monday()));
        assert_eq!(due("tomorrow please"), Some(date(2024, 6, 4)));
        assert_eq!(due("in 3 days"), Some(date(2024, 6, 6)));
        assert_eq!(due("in two weeks"), Some(date(2024, 6, 17)));
        assert_eq!(due("in a week"), Some(date(2024, 6, 10)));
    }

    #[test]
    fn week_and_month_phrases() {
        assert_eq!(due("by end of week"), Some(date(2024, 6, 7)));
        assert_eq!(due("EOW"), Some(date(2024, 6, 7)));
        assert_eq!(due("sometime this week"), Some(date(2024, 6, 7)));
        assert_eq!(due("next week"), Some(date(2024, 6, 10)));
        assert_eq!(due("by the end of the month"), Some(date(2024, 6, 30)));
        assert_eq!(due("next month"), Some(date(2024, 7, 1)));
    }

    #[test]
    fn end_of_december_rolls_year() {
        let reference = date(2024, 12, 10);
        assert_eq!(find_due_date("EOM", reference), Some(date(2024, 12, 31)));
        assert_eq!(find_due_date("next month", reference), Some(date(2025, 1, 1)));
    }

    #[test]
    fn absolute_dates() {
        assert_eq!(due("due 2024-06-01"), Some(date(2024, 6, 1)));
        assert_eq!(due("by 06/15/2024"), Some(date(2024, 6, 15)));
        assert_eq!(due("on July 4th"), Some(date(2024, 7, 4)));
        assert_eq!(due("June 20, 2025"), Some(date(2025, 6, 20)));
        assert_eq!(due("by 15 March 2025"), Some(date(2025, 3, 15)));
    }

    #[test]
    fn month_day_without_year_is_next_occurrence() {
        assert_eq!(due("January 5"), Some(date(2025, 1, 5)));
        assert_eq!(due("June 3rd"), Some(monday()));
    }

    #[test]
    fn first_reference_wins() {
        assert_eq!(due("tomorrow, or Friday at the latest"), Some(date(2024, 6, 4)));
    }

    #[test]
    fn no_reference_no_date() {
        assert_eq!(due("Research payment providers"), None);
        assert_eq!(due("Summarize today's standup"), None);
        assert_eq!(due("Version 2024-02-30 is invalid"), None);
    }

    #[test]
    fn strips_phrases_with_prepositions() {
        assert_eq!(
            strip_date_phrases("Update the authentication system by Friday"),
            "Update the authentication system"
        );
        assert_eq!(
            strip_date_phrases("Send the deck to Bob next week"),
            "Send the deck to Bob"
        );
        assert_eq!(
            strip_date_phrases("Renew the domain before 2024-07-01 please"),
            "Renew the domain please"
        );
    }

    #[test]
    fn impossible_dates_stay_in_the_text() {
        assert_eq!(
            strip_date_phrases("Fix the bug by 99/99/9999 or 2024-13-45"),
            "Fix the bug by 99/99/9999 or 2024-13-45"
        );
    }

    #[test]
    fn leap_day_waits_for_a_leap_year() {
        assert_eq!(
            find_due_date("Feb 29", date(2025, 3, 1)),
            Some(date(2028, 2, 29))
        );
        assert_eq!(
            find_due_date("Feb 29", date(2024, 1, 10)),
            Some(date(2024, 2, 29))
        );
        assert_eq!(find_due_date("June 31", date(2024, 1, 10)), None);
    }
}
