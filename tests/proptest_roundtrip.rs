//! Property tests for message parsing.
//!
//! Parsing then reassembling a well-formed line must reproduce the
//! original parameter boundaries, and CTCP extraction must account for
//! every delimited span while leaving the rest of the text intact.

use proptest::prelude::*;

use slirc_engine::Message;

fn prefix_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,8}(![a-zA-Z0-9]{1,6}@[a-z0-9.]{1,12})?"
}

fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("PRIVMSG".to_string()),
        Just("NOTICE".to_string()),
        Just("JOIN".to_string()),
        Just("MODE".to_string()),
        Just("TOPIC".to_string()),
        "[0-9]{3}",
    ]
}

proptest! {
    #[test]
    fn parse_reassemble_round_trips(
        prefix in proptest::option::of(prefix_strategy()),
        command in command_strategy(),
        middles in proptest::collection::vec("[a-zA-Z0-9#&+._-]{1,10}", 0..4),
        trailing in proptest::option::of("[a-zA-Z0-9 .,!?'-]{0,30}"),
    ) {
        let mut line = String::new();
        if let Some(prefix) = &prefix {
            line.push(':');
            line.push_str(prefix);
            line.push(' ');
        }
        line.push_str(&command);
        for middle in &middles {
            line.push(' ');
            line.push_str(middle);
        }
        if let Some(trailing) = &trailing {
            line.push_str(" :");
            line.push_str(trailing);
        }

        let msg = Message::parse(&line).expect("well-formed line must parse");

        prop_assert_eq!(msg.prefix(), prefix.as_deref());
        prop_assert_eq!(msg.command(), command.as_str());

        let mut expected = middles.clone();
        if let Some(trailing) = &trailing {
            expected.push(trailing.clone());
        }
        prop_assert_eq!(msg.params(), expected.as_slice());

        // Structural round trip: reassembling and reparsing agrees.
        let rebuilt = Message::parse(&msg.to_string()).expect("reassembled line must parse");
        prop_assert_eq!(&rebuilt, &msg);
    }

    #[test]
    fn ctcp_extraction_accounts_for_every_span(
        segments in proptest::collection::vec("[a-zA-Z ]{0,8}", 1..5),
        spans in proptest::collection::vec("[A-Z]{1,6}( [a-zA-Z0-9]{1,4}){0,2}", 0..4),
    ) {
        let mut body = String::new();
        let mut visible = String::new();

        for (i, span) in spans.iter().enumerate() {
            let segment = &segments[i % segments.len()];
            body.push_str(segment);
            visible.push_str(segment);
            body.push('\u{1}');
            body.push_str(span);
            body.push('\u{1}');
        }
        body.push_str(&segments[0]);
        visible.push_str(&segments[0]);

        let line = format!(":nick!user@host PRIVMSG #chan :{body}");
        let msg = Message::parse(&line).expect("carrier line must parse");

        // Exactly one sub-message per delimiter pair, in left-to-right
        // order, and the visible text is the original minus every span.
        prop_assert_eq!(msg.ctcp().len(), spans.len());
        for (ctcp, span) in msg.ctcp().iter().zip(&spans) {
            let word = span.split(' ').next().unwrap_or_default();
            prop_assert_eq!(ctcp.command(), word.to_ascii_uppercase());
            prop_assert_eq!(ctcp.sender(), "nick!user@host");
            prop_assert_eq!(ctcp.target(), "#chan");
        }
        prop_assert_eq!(msg.trailing(), Some(visible.as_str()));
    }
}
