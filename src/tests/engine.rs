//! Search engine scenarios on the built-in knowledge base.

use std::sync::Arc;

use crate::corpus::Corpus;
use crate::semantic::{Answer, Relevance, SearchEngine, NOT_FOUND_MESSAGE};

fn engine() -> SearchEngine {
    SearchEngine::with_defaults(Corpus::builtin().unwrap())
}

fn ids(engine: &SearchEngine, query: &str) -> Vec<String> {
    engine
        .search(query)
        .unwrap()
        .iter()
        .map(|r| r.document.id.clone())
        .collect()
}

#[test]
fn test_time_dilation_example() {
    let engine = engine();

    let results = engine.search("time dilation").unwrap();
    assert_eq!(results[0].document.title, "Time Dilation in Relativity");
    assert_eq!(results[0].relevance, Relevance::High);

    assert_eq!(
        engine.extract_concepts("What is time dilation?"),
        vec!["time", "dilation"]
    );
}

#[test]
fn test_title_matches_rank_first() {
    let engine = engine();

    assert_eq!(ids(&engine, "twin paradox")[0], "twin-paradox");
    assert_eq!(ids(&engine, "black holes")[0], "black-holes-light-cones");
    assert_eq!(ids(&engine, "GPS satellites")[0], "relativity-everyday");
}

#[test]
fn test_empty_query_and_not_found() {
    let engine = engine();

    assert!(engine.search("").unwrap().is_empty());
    assert!(engine.search("  \n").unwrap().is_empty());
    assert_eq!(engine.synthesize("", &[]), NOT_FOUND_MESSAGE);
}

#[test]
fn test_results_filtered_and_sorted() {
    let engine = engine();

    for query in [
        "light cones",
        "faster than light",
        "What is time dilation?",
        "quantum",
        "zzzz qqqq",
    ] {
        let results = engine.search(query).unwrap();
        assert!(results.iter().all(|r| r.score > 0.2), "{query}");
        assert!(
            results.windows(2).all(|w| w[0].score >= w[1].score),
            "{query}"
        );
        assert!(results.len() <= engine.documents().len());
    }
}

#[test]
fn test_ranking_is_stable() {
    let engine = engine();
    let first = ids(&engine, "light cones and causality");

    for _ in 0..5 {
        assert_eq!(ids(&engine, "light cones and causality"), first);
    }

    // a fresh engine ranks identically
    assert_eq!(ids(&self::engine(), "light cones and causality"), first);
}

#[test]
fn test_concurrent_searches_agree() {
    let engine = Arc::new(engine());
    let expected = ids(&SearchEngine::with_defaults(Corpus::builtin().unwrap()), "speed of light");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| ids(&engine, "speed of light")))
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });

    assert_eq!(engine.index().len(), engine.documents().len());
}

#[test]
fn test_ask_time_dilation() {
    let engine = engine();
    let response = engine.ask("What is time dilation?").unwrap();

    assert_eq!(response.context.concepts, vec!["time", "dilation"]);
    assert_eq!(response.results[0].document.id, "time-dilation");

    let answer = Answer::parse(&response.answer);
    assert!(answer.body.starts_with("Based on our knowledge base: "));
    assert!(answer.body.to_lowercase().contains("dilation"));
    assert_eq!(answer.sources.len(), 3);
    assert!(answer.sources[0].starts_with("Time Dilation in Relativity: Hafele"));
    assert!(answer
        .footer
        .unwrap()
        .ends_with("All data is current as of the latest update."));
}

#[test]
fn test_highlight_result_titles() {
    let engine = engine();
    let concepts = engine.extract_concepts("light cones");
    let results = engine.search_with_limit("light cones", Some(2)).unwrap();

    assert_eq!(results.len(), 2);
    for result in results {
        let highlighted = engine.highlight(&result.document.title, &concepts);
        assert!(highlighted.contains("<mark>Light</mark>"), "{highlighted}");
    }
}

#[test]
fn test_topics_are_distinct() {
    let engine = engine();
    let topics = engine.topics();

    assert_eq!(topics[0], "relativity");
    assert!(topics.contains(&"time dilation".to_string()));

    let mut lowered: Vec<String> = topics.iter().map(|t| t.to_lowercase()).collect();
    lowered.sort();
    lowered.dedup();
    assert_eq!(lowered.len(), topics.len());
}
