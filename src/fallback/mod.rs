//! Deterministic, network-free task parser.
//!
//! Substitutes for the AI path when the provider chain is unavailable or
//! explicitly bypassed. Every stage is a total function over the trimmed
//! input and the caller-supplied reference time, so identical input always
//! yields identical output. Confidence is fixed at 0.3 — best effort,
//! unverified.

pub mod patterns;

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::parse::types::{ParsedTask, TaskStatus};
use crate::parse::ParseError;
use patterns::*;

/// Confidence assigned to every fallback result.
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Maximum title length in characters before `…`-truncation.
const TITLE_MAX_CHARS: usize = 50;

/// Deadline time used when a date is resolved without an explicit time.
fn default_deadline_time() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).expect("valid literal time")
}

/// Parse a natural-language utterance into a single task, resolving
/// relative dates against `reference`.
pub fn parse(input: &str, reference: NaiveDateTime) -> Result<ParsedTask, ParseError> {
    let normalized = input.trim();
    if normalized.is_empty() {
        return Err(ParseError::FallbackFailed);
    }

    let title = build_title(normalized);
    let deadline = extract_deadline(normalized, reference);
    let estimated_duration = extract_duration(normalized);
    let status = infer_status(normalized);
    let category = infer_category(normalized);
    let priority = infer_priority(normalized, deadline, reference);
    let tags = extract_tags(normalized, category);

    Ok(ParsedTask {
        title,
        description: normalized.to_string(),
        status,
        category: Some(category.to_string()),
        deadline,
        estimated_duration,
        tags,
        priority,
        confidence: FALLBACK_CONFIDENCE,
    })
}

/// First sentence of the input with hashtags, dates, clock times and
/// temporal adverbs stripped, truncated to 50 characters.
fn build_title(input: &str) -> String {
    let cleaned = HASH_TAG.replace_all(input, "");
    let cleaned = ISO_DATE.replace_all(&cleaned, "");
    let cleaned = CLOCK_TIME.replace_all(&cleaned, "");
    let cleaned = cleaned.trim();

    let candidate = cleaned
        .split(['\n', '。', '.', '!', '?', '；', ';'])
        .next()
        .unwrap_or(cleaned)
        .trim();
    let candidate = TEMPORAL_ADVERBS.replace_all(candidate, "");
    let candidate = candidate.trim();

    if candidate.chars().count() > TITLE_MAX_CHARS {
        let truncated: String = candidate.chars().take(TITLE_MAX_CHARS).collect();
        format!("{truncated}…")
    } else {
        candidate.to_string()
    }
}

/// Deadline resolution, fixed precedence: ISO substring, explicit
/// month-day, relative-day keyword, weekday name. A clock time alone,
/// without a date anchor, yields no deadline.
fn extract_deadline(input: &str, reference: NaiveDateTime) -> Option<NaiveDateTime> {
    if let Some(cap) = ISO_DATETIME.captures(input) {
        return parse_iso_datetime(cap.get(1)?.as_str());
    }

    if let Some(cap) = MONTH_DAY.captures(input) {
        let month: u32 = cap[1].parse().ok()?;
        let day: u32 = cap[2].parse().ok()?;
        let mut date = NaiveDate::from_ymd_opt(reference.date().year(), month, day)?;
        // Already past this year: roll forward one year
        if date < reference.date() {
            date = date.with_year(date.year() + 1)?;
        }
        let time = extract_time(input).unwrap_or_else(default_deadline_time);
        return Some(NaiveDateTime::new(date, time));
    }

    let base = extract_relative_date(input, reference.date())
        .or_else(|| extract_weekday(input, reference.date()));
    let time = extract_time(input);

    base.map(|date| NaiveDateTime::new(date, time.unwrap_or_else(default_deadline_time)))
}

fn parse_iso_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.replace('T', " ");
    match raw.len() {
        10 => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(default_deadline_time())),
        16 => NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M").ok(),
        _ => NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S").ok(),
    }
}

/// 今天/明天/后天/大后天, `N天后`, 下周, 下个月.
fn extract_relative_date(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    for (keyword, days) in RELATIVE_DAYS {
        if input.contains(keyword) {
            return Some(today + Duration::days(*days));
        }
    }

    if let Some(cap) = DAYS_LATER.captures(input) {
        let days: i64 = cap[1].parse().ok()?;
        return Some(today + Duration::days(days));
    }

    if input.contains("下周") || input.contains("下星期") {
        return Some(today + Duration::days(7));
    }
    if input.contains("下个月") || input.contains("下月") {
        return today.checked_add_months(Months::new(1));
    }

    None
}

/// Weekday names resolved to the next occurrence strictly after `today`;
/// a "next week" marker pushes the match out a further week.
fn extract_weekday(input: &str, today: NaiveDate) -> Option<NaiveDate> {
    let is_next = input.contains("下周") || input.contains("下个") || input.contains("下星期");

    for (keyword, weekday) in WEEKDAYS {
        if input.contains(keyword) {
            let mut date = next_weekday(today, *weekday);
            if is_next {
                date += Duration::days(7);
            }
            return Some(date);
        }
    }
    None
}

fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let today_idx = today.weekday().num_days_from_monday() as i64;
    let target_idx = target.num_days_from_monday() as i64;
    let ahead = (target_idx - today_idx - 1).rem_euclid(7) + 1;
    today + Duration::days(ahead)
}

/// Clock time with day-period arithmetic: 下午/晚上 shift hours below 12
/// into the afternoon, 凌晨/早上 map 12 to midnight, 中午 forces noon.
fn extract_time(input: &str) -> Option<NaiveTime> {
    let cap = TIME.captures(input)?;
    let full = cap.get(0)?.as_str();
    let mut hour: u32 = cap[1].parse().ok()?;
    let minute: u32 = cap
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);

    if full.contains("下午") || full.contains("晚上") {
        if hour < 12 {
            hour += 12;
        }
    } else if full.contains("凌晨") || full.contains("早上") {
        if hour == 12 {
            hour = 0;
        }
    } else if full.contains("中午") {
        hour = 12;
    }

    NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0)
}

/// Effort estimate in minutes: hours ×60, days ×480 (8-hour workday),
/// fractional amounts truncated.
fn extract_duration(input: &str) -> Option<u32> {
    let cap = DURATION.captures(input)?;
    let amount: f64 = cap[1].parse().ok()?;
    let unit = &cap[2];

    let minutes = if unit == "小时"
        || unit == "时"
        || unit.eq_ignore_ascii_case("h")
        || unit.to_lowercase().starts_with("hour")
    {
        amount * 60.0
    } else if unit == "天" || unit == "日" || unit.to_lowercase().starts_with("day") {
        amount * 60.0 * 8.0
    } else {
        amount
    };

    Some(minutes as u32)
}

fn infer_status(input: &str) -> TaskStatus {
    if COMPLETED_KEYWORDS.iter().any(|k| input.contains(k)) {
        return TaskStatus::Completed;
    }
    if IN_PROGRESS_KEYWORDS.iter().any(|k| input.contains(k)) {
        return TaskStatus::InProgress;
    }
    if CANCELLED_KEYWORDS.iter().any(|k| input.contains(k)) {
        return TaskStatus::Cancelled;
    }
    if PAUSED_KEYWORDS.iter().any(|k| input.contains(k)) {
        return TaskStatus::Pending;
    }
    TaskStatus::Todo
}

fn infer_category(input: &str) -> &'static str {
    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|k| input.contains(k)) {
            return category;
        }
    }
    OTHER_CATEGORY
}

/// Base 50, keyword adjustments, then a deadline-proximity bonus.
/// Always clamped to 0..=100.
fn infer_priority(input: &str, deadline: Option<NaiveDateTime>, reference: NaiveDateTime) -> u8 {
    let mut priority: i32 = 50;

    if URGENT_KEYWORDS.iter().any(|k| input.contains(k)) {
        priority += 30;
    }
    if IMPORTANT_KEYWORDS.iter().any(|k| input.contains(k)) {
        priority += 20;
    }
    if LOW_PRIORITY_KEYWORDS.iter().any(|k| input.contains(k)) {
        priority -= 20;
    }

    if let Some(deadline) = deadline {
        let hours_until = (deadline - reference).num_hours();
        if hours_until < 24 {
            priority += 20;
        } else if hours_until < 72 {
            priority += 10;
        }
    }

    priority.clamp(0, 100) as u8
}

/// Hashtags in order of appearance, keyword-triggered tags, then the
/// inferred category. First-seen order, deduplicated.
fn extract_tags(input: &str, category: &str) -> Vec<String> {
    fn push_unique(tags: &mut Vec<String>, tag: &str) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }

    let mut tags = Vec::new();

    for cap in HASH_TAG.captures_iter(input) {
        push_unique(&mut tags, &cap[1]);
    }

    if input.contains("紧急") || input.contains("urgent") {
        push_unique(&mut tags, "紧急");
    }
    if input.contains("重要") || input.contains("important") {
        push_unique(&mut tags, "重要");
    }
    if input.contains("团队") || input.contains("协作") {
        push_unique(&mut tags, "团队协作");
    }
    if input.contains("个人") {
        push_unique(&mut tags, "个人");
    }

    if category != OTHER_CATEGORY {
        push_unique(&mut tags, category);
    }

    tags
}
