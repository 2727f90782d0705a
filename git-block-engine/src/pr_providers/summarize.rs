//! Reduction of raw PR discussions into bounded, prompt-friendly summaries.

use crate::pr_providers::github::{PrDiscussion, PrRecord};
use crate::types::PrDiscussionSummary;

/// Character budget for the PR body used as the summary.
pub const PR_SUMMARY_MAX_CHARS: usize = 500;
/// Character budget for each comment or review excerpt.
pub const COMMENT_EXCERPT_MAX_CHARS: usize = 200;
/// How many reviews are folded into the key comments.
const MAX_REVIEW_EXCERPTS: usize = 5;

/// Truncates at a character boundary (not bytes) to stay UTF-8 safe.
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

/// Converts a PR plus its (optional) discussion into a bounded summary.
///
/// Comments are rendered as "`[@author] text`" and reviews as
/// "`[Review @author - STATE] text`", each truncated to the excerpt budget;
/// at most `max_comments` excerpts survive in total.
pub fn summarize_pr(
    pr: &PrRecord,
    discussion: Option<&PrDiscussion>,
    max_comments: usize,
) -> PrDiscussionSummary {
    let summary = match pr.body.as_deref().filter(|b| !b.is_empty()) {
        Some(body) => truncate_chars(body, PR_SUMMARY_MAX_CHARS),
        None => "No description provided.".to_string(),
    };

    let mut key_comments: Vec<String> = Vec::new();

    if let Some(d) = discussion {
        // Round up so a budget of one still admits a comment; the final
        // truncate enforces the overall bound.
        let per_kind = max_comments.div_ceil(2);

        for comment in d.review_comments.iter().take(per_kind) {
            if let Some(body) = comment.body.as_deref().filter(|b| !b.is_empty()) {
                let author = comment.user.as_ref().map_or("Unknown", |u| u.login.as_str());
                key_comments.push(format!(
                    "[@{author}] {}",
                    truncate_chars(body, COMMENT_EXCERPT_MAX_CHARS)
                ));
            }
        }

        for comment in d.issue_comments.iter().take(per_kind) {
            if let Some(body) = comment.body.as_deref().filter(|b| !b.is_empty()) {
                let author = comment.user.as_ref().map_or("Unknown", |u| u.login.as_str());
                key_comments.push(format!(
                    "[@{author}] {}",
                    truncate_chars(body, COMMENT_EXCERPT_MAX_CHARS)
                ));
            }
        }

        for review in d.reviews.iter().take(MAX_REVIEW_EXCERPTS) {
            if let Some(body) = review.body.as_deref().filter(|b| !b.is_empty()) {
                let author = review.user.as_ref().map_or("Unknown", |u| u.login.as_str());
                key_comments.push(format!(
                    "[Review @{author} - {}] {}",
                    review.state,
                    truncate_chars(body, COMMENT_EXCERPT_MAX_CHARS)
                ));
            }
        }
    }

    key_comments.truncate(max_comments);

    PrDiscussionSummary {
        number: pr.number,
        title: pr.title.clone(),
        url: pr.html_url.clone(),
        state: pr.state.clone(),
        merged_at: pr.merged_at.clone(),
        summary,
        key_comments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pr_providers::github::{GhComment, GhReview, GhUser};

    fn pr(number: u64, body: Option<&str>) -> PrRecord {
        PrRecord {
            number,
            title: "Fix widget overflow".into(),
            html_url: format!("https://github.com/acme/widgets/pull/{number}"),
            state: "closed".into(),
            merged_at: Some("2024-05-01T12:00:00Z".into()),
            body: body.map(str::to_string),
            user: Some(GhUser { login: "alice".into() }),
        }
    }

    #[test]
    fn empty_body_gets_placeholder_summary() {
        let s = summarize_pr(&pr(7, None), None, 10);
        assert_eq!(s.number, 7);
        assert_eq!(s.summary, "No description provided.");
        assert!(s.key_comments.is_empty());
    }

    #[test]
    fn body_is_truncated_to_budget() {
        let long = "x".repeat(PR_SUMMARY_MAX_CHARS + 100);
        let s = summarize_pr(&pr(8, Some(&long)), None, 10);
        assert_eq!(s.summary.chars().count(), PR_SUMMARY_MAX_CHARS);
    }

    #[test]
    fn comments_and_reviews_are_tagged_and_bounded() {
        let discussion = PrDiscussion {
            pr: pr(9, Some("body")),
            reviews: vec![GhReview {
                body: Some("needs a test".into()),
                state: "CHANGES_REQUESTED".into(),
                user: Some(GhUser { login: "carol".into() }),
            }],
            review_comments: vec![GhComment {
                body: Some("off-by-one here".into()),
                user: Some(GhUser { login: "bob".into() }),
            }],
            issue_comments: vec![GhComment {
                body: None,
                user: Some(GhUser { login: "dave".into() }),
            }],
        };
        let s = summarize_pr(&pr(9, Some("body")), Some(&discussion), 10);
        assert_eq!(s.key_comments.len(), 2);
        assert!(s.key_comments[0].starts_with("[@bob]"));
        assert!(s.key_comments[1].starts_with("[Review @carol - CHANGES_REQUESTED]"));
    }

    #[test]
    fn one_comment_budget_still_admits_an_excerpt() {
        let discussion = PrDiscussion {
            pr: pr(11, Some("body")),
            reviews: vec![],
            review_comments: vec![GhComment {
                body: Some("tighten this bound".into()),
                user: Some(GhUser { login: "bob".into() }),
            }],
            issue_comments: vec![GhComment {
                body: Some("agreed".into()),
                user: Some(GhUser { login: "erin".into() }),
            }],
        };
        let s = summarize_pr(&pr(11, Some("body")), Some(&discussion), 1);
        assert_eq!(s.key_comments.len(), 1);
        assert!(s.key_comments[0].starts_with("[@bob]"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(300);
        let t = truncate_chars(&s, 200);
        assert_eq!(t.chars().count(), 200);
    }
}
