use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use template_core::{
    AcceptedSet, Delimiters, Run, SessionConfig, TemplateSession, Tokenizer, normalize_whitespace,
    parse, serialize,
};

fn accepted() -> AcceptedSet {
    AcceptedSet::new(["Company Name", "Agent Name", "First Name", "Last Name"]).unwrap()
}

fn random_template(rng: &mut StdRng, accepted: &AcceptedSet) -> String {
    const WORDS: [&str; 8] = ["hello", " ", "  ", "\t", "dear", ",", "thanks!", "\n"];
    let mut out = String::new();
    for _ in 0..rng.gen_range(0..12) {
        if rng.gen_bool(0.3) {
            let name = accepted.get(rng.gen_range(0..accepted.len())).unwrap();
            out.push('[');
            out.push_str(name);
            out.push(']');
        } else {
            out.push_str(WORDS[rng.gen_range(0..WORDS.len())]);
        }
    }
    out
}

#[test]
fn test_round_trip_matches_normalized_input() {
    let accepted = accepted();
    let mut rng = StdRng::seed_from_u64(0x7e3a_11c5);
    for _ in 0..500 {
        let template = random_template(&mut rng, &accepted);
        let document = parse(&template, &accepted);
        assert_eq!(
            serialize(&document),
            normalize_whitespace(&template),
            "template: {template:?}"
        );
    }
}

#[test]
fn test_parser_never_yields_adjacent_text_runs() {
    let accepted = accepted();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let mut template = random_template(&mut rng, &accepted);
        if rng.gen_bool(0.5) {
            template.push_str("[Nobody] tail ] [");
        }
        let document = parse(&template, &accepted);
        for pair in document.runs().windows(2) {
            assert!(
                !(pair[0].is_text() && pair[1].is_text()),
                "adjacent text runs in {:?}",
                document.runs()
            );
        }
    }
}

#[test]
fn test_parsed_placeholders_are_always_accepted() {
    let accepted = accepted();
    let document = parse(
        "[First Name] [first name] [Agent Name] [] [[Last Name]] [Last Name",
        &accepted,
    );
    let names: Vec<&str> = document.placeholder_names().collect();
    assert_eq!(names, ["First Name", "Agent Name"]);
    assert!(names.iter().all(|name| accepted.contains(name)));
}

#[test]
fn test_unknown_token_is_dropped_not_kept_as_text() {
    let accepted = accepted();
    let document = parse("Hi [Nickname]!", &accepted);
    assert_eq!(document.runs(), &[Run::text("Hi !")]);
    assert_eq!(serialize(&document), "Hi !");
}

#[test]
fn test_parse_does_not_normalize_in_memory_text() {
    let document = parse("  a \t b  ", &accepted());
    assert_eq!(document.runs(), &[Run::text("  a \t b  ")]);
    assert_eq!(serialize(&document), "a b");
}

#[test]
fn test_session_config_with_custom_delimiters() {
    let config = SessionConfig::from_json(
        r#"{
            "acceptedPlaceholders": ["First Name"],
            "initialTemplate": "Hello <First Name>, [First Name]",
            "delimiters": { "open": "<", "close": ">" }
        }"#,
    )
    .unwrap();
    let session = TemplateSession::new(config).unwrap();
    assert_eq!(
        session.document().runs(),
        &[
            Run::text("Hello "),
            Run::placeholder("First Name"),
            Run::text(", [First Name]"),
        ]
    );
    assert_eq!(session.value(), "Hello <First Name>, [First Name]");

    let tokenizer = Tokenizer::new(Delimiters::new('<', '>')).unwrap();
    assert_eq!(tokenizer.serialize(session.document()), session.value());
}
