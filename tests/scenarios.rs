//! End-to-end scenarios: program source → execution → export JSON.
//!
//! These drive the public API only: `execute_program` plus the JSON export
//! of the music result it returns.

use cadenza::interp::execute_program;
use cadenza::music::export;
use serde_json::json;

fn exported(source: &str) -> serde_json::Value {
    let exec = execute_program(source).expect("program should run");
    let music = exec.music.expect("program printed no music");
    serde_json::from_str(&export::to_json(&music).unwrap()).unwrap()
}

fn printed(source: &str) -> Vec<String> {
    execute_program(source).expect("program should run").printed
}

#[test]
fn single_note() {
    assert_eq!(
        exported("print Cn4/1"),
        json!({"events": [{"start": 0, "notes": [{"midi": 60, "dur": 1}]}]})
    );
}

#[test]
fn concatenation_with_a_rest() {
    assert_eq!(
        exported("print Cn4/1 ++ R/0.5 ++ En4/0.5"),
        json!({"events": [
            {"start": 0, "notes": [{"midi": 60, "dur": 1}]},
            {"start": 1, "notes": [{"midi": -1, "dur": 0.5}]},
            {"start": 1.5, "notes": [{"midi": 64, "dur": 0.5}]}
        ]})
    );
}

#[test]
fn chord_via_union() {
    assert_eq!(
        exported("print Cn4/1 | En4/1 | Gn4/1"),
        json!({"events": [{"start": 0, "notes": [
            {"midi": 60, "dur": 1},
            {"midi": 64, "dur": 1},
            {"midi": 67, "dur": 1}
        ]}]})
    );
}

#[test]
fn transposition() {
    assert_eq!(
        exported("print (Cn4/1 ++ Dn4/1) ! 12"),
        json!({"events": [
            {"start": 0, "notes": [{"midi": 72, "dur": 1}]},
            {"start": 1, "notes": [{"midi": 74, "dur": 1}]}
        ]})
    );
}

#[test]
fn while_generated_major_scale() {
    let source = "\
        procedure head_of_major(i) = { \
            var step = 2; \
            if (i == 2) or (i == 6) then { step <- 1 } else { step <- 2 } \
            return step \
        }; \
        procedure note_at(p) = { \
            var m = Cn4/1; \
            m <- m ! (p - 60) \
            return m \
        }; \
        var s = Cn4/1; var p = 60; var steps = 0; \
        while steps < 7 do { \
            p <- p + head_of_major(steps); \
            s <- s ++ note_at(p); \
            steps <- steps + 1 \
        }; \
        print s";

    let doc = exported(source);
    let events = doc["events"].as_array().unwrap();
    let midis: Vec<i64> = events
        .iter()
        .map(|e| e["notes"][0]["midi"].as_i64().unwrap())
        .collect();
    assert_eq!(midis, vec![60, 62, 64, 65, 67, 69, 71, 72]);

    let starts: Vec<i64> = events
        .iter()
        .map(|e| e["start"].as_i64().unwrap())
        .collect();
    assert_eq!(starts, (0..8).collect::<Vec<i64>>());
}

#[test]
fn let_scoping() {
    assert_eq!(
        printed("var x = 1; print (let x = 41 in x + 1) + x; print x"),
        vec!["43", "1"]
    );
}

#[test]
fn melody_reversal_program() {
    // Reverses a melody with head/tail/initialize driven by a while loop.
    let source = "\
        procedure reverse_melody(m) = { \
            var result = head m; \
            var current = tail m; \
            var b = is_empty current; \
            while not b do { \
                var n = head current; \
                n <- initialize n; \
                result <- n ++ result; \
                current <- tail current; \
                b <- is_empty current \
            } \
            return result \
        }; \
        var voice = Cn4/1 ++ En4/1 ++ Gn4/1; \
        print reverse_melody(voice)";

    assert_eq!(
        exported(source),
        json!({"events": [
            {"start": 0, "notes": [{"midi": 67, "dur": 1}]},
            {"start": 1, "notes": [{"midi": 64, "dur": 1}]},
            {"start": 2, "notes": [{"midi": 60, "dur": 1}]}
        ]})
    );
}

#[test]
fn harmonized_phrase_program() {
    // A melody over a chord progression, glued with union across sequences
    // of different lengths and a rest-delayed entry.
    let source = "\
        procedure phrase() = { \
            var f = Cn4/1 ++ Dn4/1 ++ En4/1 ++ Cn4/1 \
            return f ++ f \
        }; \
        var melody = phrase() ! 12; \
        var chords = (Cn2/4 | En3/4 | Gn3/4) ++ (Fn2/4 | An3/4 | Cn4/4); \
        print melody | chords";

    let doc = exported(source);
    let events = doc["events"].as_array().unwrap();
    assert_eq!(events.len(), 8);

    // First instant: melody note 72 merged with the C-major chord.
    let first: Vec<i64> = events[0]["notes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["midi"].as_i64().unwrap())
        .collect();
    assert_eq!(first, vec![36, 52, 55, 72]);

    // Second chord enters at beat 4, merged with the melody's fifth note.
    let fifth: Vec<i64> = events[4]["notes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["midi"].as_i64().unwrap())
        .collect();
    assert_eq!(fifth, vec![41, 57, 60, 72]);
}

#[test]
fn rest_delayed_voice() {
    let doc = exported("var a = Cn4/1 ++ En4/1; var b = R/2 ++ Gn4/1; print a | b");
    let events = doc["events"].as_array().unwrap();
    // The rest occupies [0, 2) in voice b, so its G lands on beat 2; the
    // rest itself merges into the first instant next to the C.
    assert_eq!(events.len(), 3);
    assert_eq!(events[0]["notes"][0]["midi"], json!(-1));
    assert_eq!(events[2]["start"], json!(2));
    assert_eq!(events[2]["notes"][0]["midi"], json!(67));
}

#[test]
fn printed_scalars_keep_program_order() {
    assert_eq!(
        printed("var i = 0; while i < 3 do { print i; i <- i + 1 }"),
        vec!["0", "1", "2"]
    );
}

#[test]
fn error_exit_codes() {
    let cases = [
        ("print (", 1u8),
        ("print nope", 2),
        ("print 1 ++ 2", 2),
        ("print Cn4/1 ! 100", 3),
        ("print 4 % 0", 3),
    ];
    for (source, expected) in cases {
        let err = execute_program(source).unwrap_err();
        assert_eq!(err.exit_code(), expected, "for program {source:?}");
    }
}

#[test]
fn diagnostics_carry_positions() {
    let err = execute_program("var x = 1;\nprint missing").unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("SemanticError:"), "got {text}");
    assert!(text.ends_with("at line 2 col 7"), "got {text}");
}
