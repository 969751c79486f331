use boolret_core::Analyzer;

#[test]
fn it_normalizes_and_stems() {
    let words = Analyzer::default().normalize("Running Runners RUN! The garden's gate.");
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"garden".to_string()));
    assert!(words.contains(&"s".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = Analyzer::default().normalize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn preprocess_joins_terms() {
    let a = Analyzer::default();
    assert_eq!(a.preprocess("The dog and the cat slept on the same couch."), a.normalize("dog cat slept same couch").join(" "));
}

#[test]
fn custom_stopwords_replace_defaults() {
    let a = Analyzer::default().with_stopwords(["dog"]);
    assert_eq!(a.normalize("the dog"), vec!["the"]);
}
