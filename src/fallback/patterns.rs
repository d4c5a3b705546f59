//! Compiled regular expressions and keyword tables for the deterministic
//! parser. Pure data — immutable after first use, shared freely across
//! threads without locking.

use std::sync::LazyLock;

use chrono::Weekday;
use regex::Regex;

/// ISO-like date, optionally followed by a time (`2025-06-01`,
/// `2025-06-01 15:00`, `2025-06-01T15:00:30`). ASCII word boundaries,
/// so a trailing ideograph still closes the match.
pub static ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?-u:\b)(\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}(?::\d{2})?)?)(?-u:\b)")
        .expect("valid regex")
});

/// Explicit Chinese month-day, e.g. `12月25日` or `3月8号`.
pub static MONTH_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})(?:日|号)").expect("valid regex"));

/// Clock time with an optional day-period qualifier, e.g. `下午3点`,
/// `晚上8:30`, `15:00`.
pub static TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:上午|下午|早上|中午|晚上|凌晨)?\s*(\d{1,2})(?:点|:)(\d{2})?(?:分)?")
        .expect("valid regex")
});

/// Effort estimate, e.g. `2小时`, `45分钟`, `1.5 h`, `3 days`.
pub static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(分钟|分|min|mins|小时|时|h|hours?|天|日|days?)")
        .expect("valid regex")
});

/// Hashtag token: `#` followed by word characters or CJK ideographs.
pub static HASH_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([\w\p{Han}]+)").expect("valid regex"));

/// Numeric relative day, e.g. `3天后` / `3天之后`.
pub static DAYS_LATER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)天[后之]?后").expect("valid regex"));

/// Date-only substring, stripped from title candidates.
pub static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("valid regex"));

/// `H:MM` / `H点MM` substring, stripped from title candidates.
pub static CLOCK_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[点:]\d{2}").expect("valid regex"));

/// Temporal adverbs removed from title candidates.
pub static TEMPORAL_ADVERBS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"今天|明天|后天|下周|上午|下午|早上|中午|晚上").expect("valid regex")
});

/// Relative-day keywords, ordered longest-first so substring matching
/// cannot resolve `大后天` as `后天`.
pub const RELATIVE_DAYS: &[(&str, i64)] = &[
    ("大后天", 3),
    ("后天", 2),
    ("今天", 0),
    ("今日", 0),
    ("明天", 1),
    ("明日", 1),
];

pub const WEEKDAYS: &[(&str, Weekday)] = &[
    ("周一", Weekday::Mon),
    ("周二", Weekday::Tue),
    ("周三", Weekday::Wed),
    ("周四", Weekday::Thu),
    ("周五", Weekday::Fri),
    ("周六", Weekday::Sat),
    ("周日", Weekday::Sun),
    ("星期一", Weekday::Mon),
    ("星期二", Weekday::Tue),
    ("星期三", Weekday::Wed),
    ("星期四", Weekday::Thu),
    ("星期五", Weekday::Fri),
    ("星期六", Weekday::Sat),
    ("星期日", Weekday::Sun),
];

// Status keyword sets, checked in this precedence.
pub const COMPLETED_KEYWORDS: &[&str] = &["完成", "已完成", "结束", "done", "finished", "completed"];
pub const IN_PROGRESS_KEYWORDS: &[&str] = &["进行中", "正在", "doing", "processing", "in progress"];
pub const CANCELLED_KEYWORDS: &[&str] = &["取消", "放弃", "cancel", "cancelled", "abandoned"];
pub const PAUSED_KEYWORDS: &[&str] = &["暂停", "搁置", "pending", "paused"];

/// Category keyword sets, fixed precedence. First match wins.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("学习", &["学习", "考试", "作业", "课程", "复习", "预习", "论文", "研究"]),
    ("工作", &["会议", "项目", "开发", "上线", "需求", "代码", "测试", "部署", "评审"]),
    ("健康", &["健身", "跑步", "锻炼", "健康", "运动", "瑜伽", "游泳"]),
    ("生活", &["家庭", "买菜", "做饭", "家务", "打扫", "购物", "缴费"]),
    ("娱乐", &["聚会", "约会", "电影", "旅游", "娱乐", "游戏"]),
];

pub const OTHER_CATEGORY: &str = "其他";

pub const URGENT_KEYWORDS: &[&str] = &["紧急", "urgent", "asap", "立即", "马上"];
pub const IMPORTANT_KEYWORDS: &[&str] = &["重要", "important", "关键", "核心"];
pub const LOW_PRIORITY_KEYWORDS: &[&str] = &["可选", "optional", "不急", "有空"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_datetime_matches_all_granularities() {
        for input in ["2025-06-01", "2025-06-01 15:00", "2025-06-01T15:00:30"] {
            let cap = ISO_DATETIME.captures(input).expect(input);
            assert_eq!(&cap[1], input);
        }
    }

    #[test]
    fn iso_datetime_keeps_time_before_an_ideograph() {
        let cap = ISO_DATETIME.captures("2025-07-01 09:30完成部署").unwrap();
        assert_eq!(&cap[1], "2025-07-01 09:30");
    }

    #[test]
    fn month_day_matches_both_suffixes() {
        assert_eq!(&MONTH_DAY.captures("12月25日").unwrap()[1], "12");
        assert_eq!(&MONTH_DAY.captures("3月8号").unwrap()[2], "8");
    }

    #[test]
    fn time_captures_qualifier_in_full_match() {
        let cap = TIME.captures("今天下午3点开会").unwrap();
        assert!(cap.get(0).unwrap().as_str().contains("下午"));
        assert_eq!(&cap[1], "3");
        assert!(cap.get(2).is_none());
    }

    #[test]
    fn duration_captures_amount_and_unit() {
        let cap = DURATION.captures("大概1.5小时搞定").unwrap();
        assert_eq!(&cap[1], "1.5");
        assert_eq!(&cap[2], "小时");
    }

    #[test]
    fn hash_tag_matches_cjk_tokens() {
        let tags: Vec<&str> = HASH_TAG
            .captures_iter("#紧急 #work2 计划")
            .map(|c| c.get(1).unwrap().as_str())
            .collect();
        assert_eq!(tags, vec!["紧急", "work2"]);
    }

    #[test]
    fn relative_days_are_ordered_longest_first() {
        // 大后天 contains 后天; the table order is what keeps +3 winning.
        let first_hit = RELATIVE_DAYS
            .iter()
            .find(|(kw, _)| "大后天交作业".contains(kw))
            .unwrap();
        assert_eq!(first_hit.1, 3);
    }
}
