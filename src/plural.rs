//! Counter wording for the active-task line.
//!
//! Russian nouns take one of three forms after a number, picked from the last
//! one or two digits.

/// Grammatical form of a noun following a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declension {
    /// 1, 21, 31, ... (but not 11)
    One,
    /// 2-4, 22-24, ... (but not 12-14)
    Few,
    /// 0, 5-20, 25-30, ...
    Many,
}

pub fn declension(count: u64) -> Declension {
    let last_two = count % 100;
    if (11..=14).contains(&last_two) {
        return Declension::Many;
    }
    match count % 10 {
        1 => Declension::One,
        2..=4 => Declension::Few,
        _ => Declension::Many,
    }
}

/// Form of "задача" (task) for `count`.
pub fn task_word(count: u64) -> &'static str {
    match declension(count) {
        Declension::One => "задача",
        Declension::Few => "задачи",
        Declension::Many => "задач",
    }
}

/// Counter text such as `"3 задачи"`.
pub fn counter_label(count: u64) -> String {
    format!("{count} {}", task_word(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declension_follows_last_digits() {
        let cases = [
            (0, Declension::Many),
            (1, Declension::One),
            (2, Declension::Few),
            (4, Declension::Few),
            (5, Declension::Many),
            (11, Declension::Many),
            (12, Declension::Many),
            (14, Declension::Many),
            (21, Declension::One),
            (22, Declension::Few),
            (25, Declension::Many),
            (100, Declension::Many),
            (101, Declension::One),
            (111, Declension::Many),
            (1002, Declension::Few),
        ];
        for (count, expected) in cases {
            assert_eq!(declension(count), expected, "count {count}");
        }
    }

    #[test]
    fn task_word_forms() {
        assert_eq!(task_word(0), "задач");
        assert_eq!(task_word(1), "задача");
        assert_eq!(task_word(3), "задачи");
        assert_eq!(task_word(11), "задач");
    }

    #[test]
    fn counter_label_joins_count_and_word() {
        assert_eq!(counter_label(21), "21 задача");
        assert_eq!(counter_label(5), "5 задач");
    }
}
