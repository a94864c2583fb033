// src/summary.rs

use crate::model::UserDataset;

const DISCLAIMER: &str = "_This data is generated automatically via GitHub Actions._";

/// Builds the markdown blurb for the README summary section.
pub fn generate_summary(data: &UserDataset, window_days: i64) -> String {
    let period = match window_days {
        365 => "the last year".to_string(),
        1 => "the last day".to_string(),
        days => format!("the last {days} days"),
    };

    let mut lines = vec![
        "### Recent Activity Summary".to_string(),
        format!("Hello, I'm {}!", data.account.display_name()),
        format!(
            "In {period}, I've made {} commits across my public repositories.",
            data.commits.len()
        ),
    ];

    // Equal shares: the first entry in map order wins
    let mut most_used: Option<(&str, f64)> = None;
    for (language, &share) in &data.languages {
        if most_used.map_or(true, |(_, top)| share > top) {
            most_used = Some((language.as_str(), share));
        }
    }
    if let Some((language, share)) = most_used {
        lines.push(format!("My most used language is **{language}** ({share:.1}%)."));
    }

    lines.push(DISCLAIMER.to_string());
    lines.join("\n\n") + "\n"
}
