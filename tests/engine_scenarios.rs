//! End-to-end resolution scenarios against small corpora and the built-in one.

use std::sync::Arc;

use mathchat::batch::{run_batch, BatchConfig};
use mathchat::config::EngineConfig;
use mathchat::corpus::{
    builtin_knowledge_base, ConversationalEntry, CorpusIndex, KnowledgeBase, MathPatternSet,
};
use mathchat::engine::{DecisionKind, IntentEngine, NO_MATCH_REPLY};
use mathchat::policy::{Resolution, ResolutionKind};
use mathchat::responder::TimeOfDay;
use mathchat::similarity::MetricKind;
use mathchat::solver;
use rand::rngs::StdRng;
use rand::SeedableRng;

const THANKS_RESPONSES: [&str; 2] = ["You're welcome!", "No problem!"];

fn engine_for(kb: KnowledgeBase, config: &EngineConfig) -> IntentEngine {
    IntentEngine::new(CorpusIndex::from_knowledge_base(kb).unwrap(), config)
}

fn builtin_engine(metric: MetricKind) -> IntentEngine {
    let config = EngineConfig {
        metric,
        ..EngineConfig::default()
    };
    engine_for(builtin_knowledge_base().unwrap(), &config)
}

fn thanks_kb() -> KnowledgeBase {
    KnowledgeBase::new()
        .with_entry(ConversationalEntry::new(
            "thanks",
            &["thank you", "thx"],
            &THANKS_RESPONSES,
        ))
        .with_math_patterns(
            MathPatternSet::new()
                .with("plus", ["+", "plus"])
                .with("minus", ["-", "minus"]),
        )
}

#[test]
fn thanks_in_any_case_gets_a_known_reply() {
    let engine = engine_for(thanks_kb(), &EngineConfig::default());
    let mut rng = StdRng::seed_from_u64(3);

    for message in ["Thanks", "THANK YOU", "  thx  "] {
        let decision = engine.respond_at(message, &mut rng, TimeOfDay::Afternoon);
        assert_eq!(decision.kind, DecisionKind::Chat, "message {:?}", message);
        assert_eq!(decision.confidence, 100);
        assert!(THANKS_RESPONSES.contains(&decision.text.as_str()));
    }
}

#[test]
fn exact_phrasing_beats_math_tokens() {
    let kb = thanks_kb().with_entry(ConversationalEntry::new(
        "what is 2 + 2",
        &[],
        &["Four, but ask me something harder."],
    ));
    let engine = engine_for(kb, &EngineConfig::default());

    match engine.resolve("What is 2 + 2") {
        Resolution::Conversation { entry, score } => {
            assert_eq!(entry.input, "what is 2 + 2");
            assert_eq!(score, 1.0);
        }
        other => panic!("expected conversation, got {:?}", other),
    }
}

#[test]
fn bare_arithmetic_routes_to_math_and_solves() {
    let engine = builtin_engine(MetricKind::Bigram);
    let mut rng = StdRng::seed_from_u64(11);

    let decision = engine.respond("2 + 2", &mut rng);
    assert_eq!(decision.kind, DecisionKind::Math);
    assert_eq!(decision.category.as_deref(), Some("plus"));
    assert_eq!(decision.matched_token.as_deref(), Some("+"));

    let solution = solver::solve(&decision.text, "plus").unwrap();
    assert_eq!(solution.answer, 4.0);
}

#[test]
fn first_declared_category_wins_when_several_match() {
    let engine = builtin_engine(MetricKind::Bigram);
    // Both "-" (minus) and "times" are present; minus is declared first.
    assert_eq!(
        engine.resolve("3 times -2"),
        Resolution::MathPattern {
            category: "minus",
            matched_token: "-"
        }
    );
}

#[test]
fn empty_and_blank_messages_fall_back() {
    let engine = builtin_engine(MetricKind::Bigram);
    let mut rng = StdRng::seed_from_u64(0);

    assert_eq!(engine.resolve(""), Resolution::NoMatch);
    let decision = engine.respond("   ", &mut rng);
    assert_eq!(decision.kind, DecisionKind::Fallback);
    assert_eq!(decision.text, NO_MATCH_REPLY);
}

#[test]
fn tied_scores_pick_the_first_entry() {
    let kb = KnowledgeBase::new()
        .with_entry(ConversationalEntry::new(
            "one two three four zed",
            &[],
            &["first"],
        ))
        .with_entry(ConversationalEntry::new(
            "zed one two three four",
            &[],
            &["second"],
        ));
    let engine = engine_for(kb, &EngineConfig::default());

    let table = engine.score("one two three four five");
    let scores: Vec<f64> = table.conversation_scores.iter().map(|c| c.score).collect();
    assert_eq!(scores, vec![0.75, 0.75]);

    match engine.resolve("one two three four five") {
        Resolution::Conversation { entry, score } => {
            assert_eq!(entry.input, "one two three four zed");
            assert_eq!(score, 0.75);
        }
        other => panic!("expected conversation, got {:?}", other),
    }
}

#[test]
fn threshold_is_configurable() {
    let kb = KnowledgeBase::new().with_entry(ConversationalEntry::new(
        "one two three four zed",
        &[],
        &["first"],
    ));
    let strict = EngineConfig {
        conversation_threshold: 0.8,
        ..EngineConfig::default()
    };
    let engine = engine_for(kb, &strict);
    assert_eq!(
        engine.resolve("one two three four five").kind(),
        ResolutionKind::NoMatch
    );
}

#[test]
fn thank_u_needs_the_edit_metric() {
    let bigram = builtin_engine(MetricKind::Bigram);
    assert_eq!(bigram.resolve("thank u"), Resolution::NoMatch);

    let levenshtein = builtin_engine(MetricKind::Levenshtein);
    match levenshtein.resolve("thank u") {
        Resolution::Conversation { entry, score } => {
            assert_eq!(entry.input, "thanks");
            assert!((score - 7.0 / 9.0).abs() < 1e-9);
        }
        other => panic!("expected conversation, got {:?}", other),
    }
}

#[test]
fn shared_engine_resolves_consistently_across_threads() {
    let engine = Arc::new(builtin_engine(MetricKind::Bigram));
    let messages = ["hello", "2 + 2", "thank u", "good morning to you", ""];
    let expected: Vec<ResolutionKind> = messages.iter().map(|m| engine.resolve(m).kind()).collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                messages
                    .iter()
                    .map(|m| engine.resolve(m).kind())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[tokio::test]
async fn batch_keeps_input_order_under_concurrency() {
    let engine = Arc::new(builtin_engine(MetricKind::Bigram));
    let messages: Vec<String> = (0..20)
        .map(|i| {
            if i % 2 == 0 {
                format!("{} + {}", i, i)
            } else {
                "hello".to_string()
            }
        })
        .collect();
    let config = BatchConfig {
        concurrency: 4,
        ..BatchConfig::default()
    };

    let results = run_batch(engine, messages.clone(), &config).await;
    assert_eq!(results.len(), 20);
    for (i, result) in results.iter().enumerate() {
        assert_eq!(result.index, i);
        assert_eq!(result.message, messages[i]);
        let decision = result.decision.as_ref().unwrap();
        if i % 2 == 0 {
            assert_eq!(decision.kind, DecisionKind::Math);
            assert_eq!(result.solution.as_ref().unwrap().answer, (2 * i) as f64);
        } else {
            assert_eq!(decision.kind, DecisionKind::Chat);
        }
    }
}
