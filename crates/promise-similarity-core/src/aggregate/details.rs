//! Detail reports for manual review of one promisor's matches

use serde::{Deserialize, Serialize};

use crate::config::DetailFilter;
use crate::promise::Promise;
use crate::similarity::{Related, Similarities};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    Source,
    Match,
}

/// One row of a detail report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    pub kind: DetailKind,
    pub id: i64,
    pub promisor: String,
    pub period: String,
    /// Empty on source rows
    pub score: Option<f64>,
    pub body: String,
    pub url: String,
}

impl DetailRow {
    fn new(kind: DetailKind, promise: &Promise, score: Option<f64>, url_template: &str) -> Self {
        Self {
            kind,
            id: promise.id,
            promisor: promise.promisor.clone(),
            period: promise.period.clone(),
            score,
            body: promise.body.clone(),
            url: promise.review_url(url_template),
        }
    }
}

impl DetailFilter {
    /// File-safe name for the report, from every filter value
    pub fn slug(&self) -> String {
        let parts: Vec<&str> = std::iter::once(self.promisor.as_str())
            .chain(self.compare.iter().map(String::as_str))
            .chain(self.periods.iter().map(String::as_str))
            .collect();
        slug::slugify(parts.join("-"))
    }

    fn includes_period(&self, period: &str) -> bool {
        self.periods.is_empty() || self.periods.iter().any(|p| p == period)
    }

    fn includes_match(&self, promise: &Promise) -> bool {
        (self.compare.is_empty() || self.compare.iter().any(|c| *c == promise.promisor))
            && self.includes_period(&promise.period)
    }

    /// True when `promise` is one of the report's source promises
    pub fn selects(&self, promise: &Promise) -> bool {
        promise.promisor == self.promisor && self.includes_period(&promise.period)
    }
}

/// Source promises matching `filter`, each followed by its filtered matches
/// in descending score order. Sources without matches are left out.
pub fn detail_report(
    similarities: &Similarities,
    promises: &[Promise],
    filter: &DetailFilter,
    url_template: &str,
) -> Vec<DetailRow> {
    let mut rows = Vec::new();

    for source in promises.iter().filter(|p| filter.selects(p)) {
        let mut matches: Vec<&Related> = similarities
            .related(source.index)
            .iter()
            .filter(|related| related.index != source.index)
            .filter(|related| filter.includes_match(&promises[related.index]))
            .collect();

        if matches.is_empty() {
            continue;
        }

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.index.cmp(&b.index)));

        rows.push(DetailRow::new(DetailKind::Source, source, None, url_template));
        rows.extend(matches.into_iter().map(|related| {
            DetailRow::new(
                DetailKind::Match,
                &promises[related.index],
                Some(related.score),
                url_template,
            )
        }));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::DocumentSimilarity;

    const URL: &str = "https://lofter.holderdeord.no/?q={}&ids=true";

    fn corpus() -> Vec<Promise> {
        [
            ("Høyre", "2013-2017"),
            ("Høyre", "2017-2021"),
            ("Fremskrittspartiet", "2013-2017"),
            ("Venstre", "2013-2017"),
        ]
        .iter()
        .enumerate()
        .map(|(index, &(promisor, period))| Promise {
            id: index as i64 + 1,
            index,
            promisor: promisor.to_string(),
            period: period.to_string(),
            body: format!("body {}", index),
        })
        .collect()
    }

    fn similarities() -> Similarities {
        let related = |pairs: &[(usize, f64)]| -> Vec<Related> {
            pairs
                .iter()
                .map(|&(index, score)| Related { index, score })
                .collect()
        };
        Similarities::from_entries(vec![
            DocumentSimilarity {
                index: 0,
                related: related(&[(3, 0.95), (2, 0.8), (1, 0.75)]),
            },
            DocumentSimilarity {
                index: 1,
                related: related(&[(0, 0.75)]),
            },
        ])
    }

    #[test]
    fn test_source_then_matches() {
        let filter = DetailFilter {
            promisor: "Høyre".to_string(),
            ..DetailFilter::default()
        };
        let rows = detail_report(&similarities(), &corpus(), &filter, URL);

        let summary: Vec<(DetailKind, i64)> = rows.iter().map(|r| (r.kind, r.id)).collect();
        assert_eq!(
            summary,
            vec![
                (DetailKind::Source, 1),
                (DetailKind::Match, 4),
                (DetailKind::Match, 3),
                (DetailKind::Match, 2),
                (DetailKind::Source, 2),
                (DetailKind::Match, 1),
            ]
        );
        assert_eq!(rows[0].score, None);
        assert_eq!(rows[1].score, Some(0.95));
        assert_eq!(rows[1].url, "https://lofter.holderdeord.no/?q=4&ids=true");
    }

    #[test]
    fn test_compare_and_period_filters() {
        let filter = DetailFilter {
            promisor: "Høyre".to_string(),
            compare: vec!["Fremskrittspartiet".to_string()],
            periods: vec!["2013-2017".to_string()],
        };
        let rows = detail_report(&similarities(), &corpus(), &filter, URL);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, 1);
        assert_eq!(rows[1].id, 3);
        assert_eq!(rows[1].promisor, "Fremskrittspartiet");
    }

    #[test]
    fn test_sources_without_matches_skipped() {
        let filter = DetailFilter {
            promisor: "Venstre".to_string(),
            ..DetailFilter::default()
        };
        assert!(detail_report(&similarities(), &corpus(), &filter, URL).is_empty());
    }

    #[test]
    fn test_filter_slug() {
        let filter = DetailFilter {
            promisor: "Høyre".to_string(),
            compare: vec!["Fremskrittspartiet".to_string()],
            periods: vec!["2013-2017".to_string()],
        };
        assert_eq!(filter.slug(), "hoyre-fremskrittspartiet-2013-2017");
    }
}
