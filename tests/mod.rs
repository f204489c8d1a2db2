use calwire::{ContentLine, LineListener, ParseControl, RawReader};

/// Listener collecting every event for inspection.
#[derive(Default)]
pub struct Recorder {
    pub properties: Vec<ContentLine>,
    pub begins: Vec<String>,
    pub ends: Vec<String>,
    pub invalid: Vec<String>,
    pub valueless: Vec<(String, String)>,
}

impl LineListener for Recorder {
    fn begin_component(&mut self, name: &str) -> ParseControl {
        self.begins.push(name.to_owned());
        ParseControl::Continue
    }

    fn end_component(&mut self, name: &str) -> ParseControl {
        self.ends.push(name.to_owned());
        ParseControl::Continue
    }

    fn read_property(&mut self, line: ContentLine) -> ParseControl {
        self.properties.push(line);
        ParseControl::Continue
    }

    fn invalid_line(&mut self, raw: &str) -> ParseControl {
        self.invalid.push(raw.to_owned());
        ParseControl::Continue
    }

    fn valueless_parameter(&mut self, property: &str, parameter: &str) -> ParseControl {
        self.valueless.push((property.to_owned(), parameter.to_owned()));
        ParseControl::Continue
    }
}

pub fn record(input: &str) -> Recorder {
    let mut recorder = Recorder::default();
    RawReader::from_slice(input.as_bytes())
        .read(&mut recorder)
        .unwrap();
    recorder
}

pub mod raw {
    use super::record;
    use calwire::RawReader;

    #[test]
    fn folded_caret_parameter_decodes() {
        let input = "GEO;X-ADDR=\"Line1, Apt 2^nLine2\":40.0;8\r\n 0.0\r\n";
        let recorder = record(input);
        let line = &recorder.properties[0];
        assert_eq!(line.name, "GEO");
        assert_eq!(line.params.get("X-ADDR"), Some("Line1, Apt 2\nLine2"));
        assert_eq!(line.value, "40.0;80.0");
    }

    #[test]
    fn caret_disabled_keeps_sequence_literal() {
        let input = "GEO;X-ADDR=\"Line1^nLine2\":40.0;80.0\r\n";
        let mut recorder = super::Recorder::default();
        RawReader::from_slice(input.as_bytes())
            .caret_decoding(false)
            .read(&mut recorder)
            .unwrap();
        let line = &recorder.properties[0];
        assert_eq!(line.params.get("X-ADDR"), Some("Line1^nLine2"));
    }

    #[test]
    fn backslash_escapes_in_parameter_values() {
        let recorder = record("X;P=a\\nb\\\\c\\\"d:v\r\n");
        assert_eq!(recorder.properties[0].params.get("P"), Some("a\nb\\c\"d"));
    }

    #[test]
    fn unknown_escape_keeps_both_characters() {
        let recorder = record("X;P=a\\qb^qc:v\r\n");
        assert_eq!(recorder.properties[0].params.get("P"), Some("a\\qb^qc"));
    }

    #[test]
    fn multi_valued_member_parameter() {
        let recorder = record("ATTENDEE;MEMBER=\"a\",\"b\":mailto:x\r\n");
        assert_eq!(recorder.properties[0].params.get_all("MEMBER"), ["a", "b"]);
        assert_eq!(recorder.properties[0].value, "mailto:x");
    }

    #[test]
    fn begin_end_balance() {
        let recorder = record(
            "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nBEGIN:VALARM\r\nEND:VALARM\r\nEND:VTODO\r\nEND:VCALENDAR\r\n",
        );
        assert_eq!(recorder.begins.len(), recorder.ends.len());
        assert!(recorder.invalid.is_empty());
        assert!(recorder.valueless.is_empty());
    }
}

pub mod roundtrip {
    use super::record;
    use calwire::RawWriter;
    use rstest::rstest;

    #[rstest]
    #[case("SUMMARY:Write report\r\n")]
    #[case("EMPTY:\r\n")]
    #[case("DTSTART;VALUE=DATE:20230110\r\n")]
    #[case("ATTENDEE;MEMBER=\"mailto:a\",\"mailto:b\":mailto:c\r\n")]
    #[case("X-ADDR;LABEL=\"123 Main St, Suite 100^nPittsburgh\":here\r\n")]
    #[case("X;P=a=b:v\r\n")]
    #[case("ATTENDEE;RSVP:mailto:x\r\n")]
    #[case("DESCRIPTION;ALTREP=\"cid:part1\":The fox jumps; quickly, too:\r\n")]
    fn encode_decode_is_identity(#[case] input: &str) {
        let recorder = record(input);
        assert_eq!(recorder.properties.len(), 1, "{input:?}");
        let mut writer = RawWriter::new(Vec::new());
        writer.write_property(&recorder.properties[0]).unwrap();
        let out = writer.into_inner().unwrap();
        similar_asserts::assert_eq!(String::from_utf8(out).unwrap(), input);
    }

    #[test]
    fn folded_output_reparses_to_the_same_line() {
        let value = "x".repeat(200);
        let input = format!("DESCRIPTION:{value}\r\n");
        let recorder = record(&input);

        let mut writer = RawWriter::new(Vec::new());
        writer.write_property(&recorder.properties[0]).unwrap();
        let folded = writer.into_inner().unwrap();
        let folded = String::from_utf8(folded).unwrap();
        assert!(folded.lines().all(|line| line.len() <= 75));

        let reparsed = record(&folded);
        assert_eq!(reparsed.properties[0], recorder.properties[0]);
    }
}

pub mod reader {
    use calwire::{IcalReader, PropertyValue, ReadError, validator::code};
    use itertools::Itertools;

    #[test]
    fn minimal_todo() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:abc\r\nDTSTAMP:20230101T000000Z\r\nSUMMARY:Write report\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
        let (calendar, warnings) = IcalReader::from_slice(input.as_bytes())
            .read_one()
            .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(calendar.name(), "VCALENDAR");
        assert_eq!(calendar.components().len(), 1);

        let todo = &calendar.components()[0];
        assert_eq!(todo.name(), "VTODO");
        assert_eq!(todo.property("UID").unwrap().as_text(), Some("abc"));
        assert_eq!(
            todo.property("SUMMARY").unwrap().as_text(),
            Some("Write report")
        );
        let stamp = todo.property("DTSTAMP").unwrap().as_datetime().unwrap();
        assert!(stamp.has_time());
        assert!(stamp.is_utc());
        assert_eq!(stamp.format(), "20230101T000000Z");
    }

    #[test]
    fn invalid_line_is_tolerated() {
        let input = "BEGIN:VTODO\r\nGARBAGE-WITHOUT-COLON\r\nUID:abc\r\nEND:VTODO\r\n";
        let mut reader = IcalReader::from_slice(input.as_bytes());
        let todo = reader.read_next().unwrap().unwrap();
        assert_eq!(todo.property("UID").unwrap().as_text(), Some("abc"));
        let warning = reader
            .warnings()
            .iter()
            .find(|warning| warning.code == code::INVALID_LINE)
            .unwrap();
        assert_eq!(warning.args, ["GARBAGE-WITHOUT-COLON"]);
        assert_eq!(warning.path, ["VTODO"]);
    }

    #[test]
    fn stray_end_marker_keeps_the_stack_intact() {
        let input =
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VTODO\r\nPRODID:x\r\nEND:VCALENDAR\r\n";
        let mut reader = IcalReader::from_slice(input.as_bytes());
        let calendar = reader.read_next().unwrap().unwrap();
        assert_eq!(calendar.property("VERSION").unwrap().as_text(), Some("2.0"));
        assert_eq!(calendar.property("PRODID").unwrap().as_text(), Some("x"));
        let codes = reader.warnings().iter().map(|w| w.code).collect_vec();
        assert_eq!(codes, vec![code::UNMATCHED_END]);
    }

    #[test]
    fn unterminated_component_is_an_error() {
        let input = "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:a\r\n";
        let result = IcalReader::from_slice(input.as_bytes()).read_next();
        assert!(matches!(
            result,
            Err(ReadError::UnterminatedComponent(name)) if name == "VTODO"
        ));
    }

    #[test]
    fn read_one_rejects_empty_and_surplus_input() {
        assert!(matches!(
            IcalReader::from_slice(b"".as_slice()).read_one(),
            Err(ReadError::EmptyInput)
        ));

        let two = "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\nBEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n";
        assert!(matches!(
            IcalReader::from_slice(two.as_bytes()).read_one(),
            Err(ReadError::TooManyComponents)
        ));
    }

    #[test]
    fn iterates_over_multiple_calendars() {
        let two = "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\nBEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n";
        let calendars = IcalReader::from_slice(two.as_bytes())
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(calendars.len(), 2);
    }

    #[test]
    fn unknown_properties_are_kept_raw() {
        let input = "BEGIN:VTODO\r\nX-FOO;X-P=1:some;value:here\r\nEND:VTODO\r\n";
        let (todo, warnings) = IcalReader::from_slice(input.as_bytes()).read_one().unwrap();
        assert!(warnings.is_empty());
        let property = todo.property("X-FOO").unwrap();
        assert_eq!(property.params.get("X-P"), Some("1"));
        assert_eq!(
            property.value,
            PropertyValue::Raw("some;value:here".to_owned())
        );
    }

    #[test]
    fn malformed_value_decodes_to_raw_with_warning() {
        let input = "BEGIN:VTODO\r\nDTSTART:yesterday\r\nEND:VTODO\r\n";
        let (todo, warnings) = IcalReader::from_slice(input.as_bytes()).read_one().unwrap();
        assert_eq!(
            todo.property("DTSTART").unwrap().value,
            PropertyValue::Raw("yesterday".to_owned())
        );
        let codes = warnings.iter().map(|w| w.code).collect_vec();
        assert_eq!(codes, vec![code::MALFORMED_VALUE]);
    }
}

pub mod writer {
    use calwire::{
        Component, IcalReader, IcalWriter, Parameters, Property, PropertyValue, WriteError,
        generator::write_to_string,
    };
    use calwire::types::CalDateTime;

    #[test]
    fn date_only_start_gets_a_value_parameter() {
        let mut todo = Component::new("VTODO");
        todo.add_property(Property::text("UID", "a"));
        todo.add_property(Property::new(
            "DTSTART",
            CalDateTime::parse("20230110").unwrap(),
        ));
        let out = write_to_string(&todo).unwrap();
        assert!(out.contains("DTSTART;VALUE=DATE:20230110\r\n"));
    }

    #[test]
    fn existing_value_parameter_is_left_alone() {
        let mut params = Parameters::new();
        params.set("VALUE", "DATE");
        let mut todo = Component::new("VTODO");
        todo.add_property(
            Property::new("DTSTART", CalDateTime::parse("20230110").unwrap())
                .with_params(params),
        );
        let out = write_to_string(&todo).unwrap();
        assert_eq!(out.matches("VALUE=DATE").count(), 1);
    }

    #[test]
    fn quote_in_parameter_fails_without_caret_encoding() {
        let mut params = Parameters::new();
        params.set("CN", "say \"hi\"");
        let mut todo = Component::new("VTODO");
        todo.add_property(Property::text("ATTENDEE", "mailto:x").with_params(params));

        let mut writer = IcalWriter::new(Vec::new()).caret_encoding(false);
        assert!(matches!(
            writer.write(&todo),
            Err(WriteError::UnencodableParameter(parameter, _)) if parameter == "CN"
        ));
    }

    #[test]
    fn fixture_survives_a_full_round_trip() {
        let input = include_str!("./resources/todos.ics");
        let (calendar, warnings) = IcalReader::from_slice(input.as_bytes()).read_one().unwrap();
        assert!(warnings.is_empty(), "{warnings:?}");
        similar_asserts::assert_eq!(write_to_string(&calendar).unwrap(), input);
    }

    #[test]
    fn lowercase_input_normalises_but_round_trips_structurally() {
        let input = "begin:vcalendar\r\nversion:2.0\r\nend:vcalendar\r\n";
        let (calendar, _) = IcalReader::from_slice(input.as_bytes()).read_one().unwrap();
        assert_eq!(calendar.name(), "VCALENDAR");
        let out = write_to_string(&calendar).unwrap();
        similar_asserts::assert_eq!(out, "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nEND:VCALENDAR\r\n");
    }

    #[test]
    fn valueless_parameter_writes_as_a_bare_name() {
        let mut params = Parameters::new();
        params.push_valueless("RSVP");
        params.set("CN", "Jo");
        let mut todo = Component::new("VTODO");
        todo.add_property(Property::text("ATTENDEE", "mailto:x").with_params(params));
        let out = write_to_string(&todo).unwrap();
        assert!(out.contains("ATTENDEE;RSVP;CN=Jo:mailto:x\r\n"));
        assert!(!out.contains("RSVP="));
    }

    #[test]
    fn raw_value_is_written_verbatim() {
        let mut component = Component::new("VTODO");
        component.add_property(Property::new(
            "X-NOTES",
            PropertyValue::Raw("semi;colon:comma,".to_owned()),
        ));
        let out = write_to_string(&component).unwrap();
        assert!(out.contains("X-NOTES:semi;colon:comma,\r\n"));
    }
}

pub mod validator {
    use calwire::{Component, IcalReader, Property, Registry, validate, validator::code};
    use itertools::Itertools;

    fn parse(input: &str) -> Component {
        IcalReader::from_slice(input.as_bytes())
            .read_one()
            .unwrap()
            .0
    }

    fn codes(component: &Component) -> Vec<u32> {
        validate(component, &Registry::ical())
            .iter()
            .map(|warning| warning.code)
            .collect_vec()
    }

    #[test]
    fn minimal_todo_validates_clean() {
        let calendar = parse(
            "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nUID:abc\r\nDTSTAMP:20230101T000000Z\r\nSUMMARY:Write report\r\nEND:VTODO\r\nEND:VCALENDAR\r\n",
        );
        assert_eq!(codes(&calendar), Vec::<u32>::new());
    }

    #[test]
    fn due_before_start() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART;VALUE=DATE:20230110\r\nDUE;VALUE=DATE:20230105\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::START_AFTER_END]);
    }

    #[test]
    fn start_and_due_must_agree_on_having_a_time() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART:20230101T090000Z\r\nDUE;VALUE=DATE:20230105\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::START_END_TYPE_MISMATCH]);
    }

    #[test]
    fn due_and_duration_conflict() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART;VALUE=DATE:20230109\r\nDUE;VALUE=DATE:20230110\r\nDURATION:P1D\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::MUTUALLY_EXCLUSIVE]);
    }

    #[test]
    fn duration_requires_start() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDURATION:P1D\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::MISSING_COMPANION]);
    }

    #[test]
    fn foreign_status_vocabulary_warns() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nSTATUS:TENTATIVE\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::INVALID_STATUS]);
    }

    #[test]
    fn custom_status_word_is_left_alone() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nSTATUS:X-PENDING-REVIEW\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), Vec::<u32>::new());
    }

    #[test]
    fn recurrence_id_must_match_start_type() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART:20230101T090000Z\r\nRECURRENCE-ID;VALUE=DATE:20230101\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::RECURRENCE_ID_TYPE_MISMATCH]);
    }

    #[test]
    fn time_rule_parts_need_a_date_time_start() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART;VALUE=DATE:20230101\r\nRRULE:FREQ=DAILY;BYHOUR=9\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::TIME_PARTS_WITH_DATE_START]);
    }

    #[test]
    fn at_most_one_rrule() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nRRULE:FREQ=DAILY\r\nRRULE:FREQ=WEEKLY\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::MULTIPLE_RRULES]);
    }

    #[test]
    fn cardinality_codes() {
        let todo = parse(
            "BEGIN:VTODO\r\nDTSTAMP:20230101T000000Z\r\nSUMMARY:a\r\nSUMMARY:b\r\nEND:VTODO\r\n",
        );
        let warnings = validate(&todo, &Registry::ical());
        let codes = warnings.iter().map(|w| w.code).sorted().collect_vec();
        assert_eq!(codes, vec![code::MISSING_REQUIRED, code::MULTIPLE_INSTANCES]);
        let missing = warnings
            .iter()
            .find(|w| w.code == code::MISSING_REQUIRED)
            .unwrap();
        assert_eq!(missing.property.as_deref(), Some("UID"));
    }

    #[test]
    fn alarm_repeat_needs_duration() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nBEGIN:VALARM\r\nACTION:DISPLAY\r\nTRIGGER:-PT5M\r\nREPEAT:2\r\nEND:VALARM\r\nEND:VTODO\r\n",
        );
        assert_eq!(codes(&todo), vec![code::REPEAT_DURATION_PAIR]);
    }

    #[test]
    fn warning_paths_name_the_component_chain() {
        let calendar = parse(
            "BEGIN:VCALENDAR\r\nBEGIN:VTODO\r\nDTSTAMP:20230101T000000Z\r\nUID:a\r\nBEGIN:VALARM\r\nACTION:DISPLAY\r\nEND:VALARM\r\nEND:VTODO\r\nEND:VCALENDAR\r\n",
        );
        let warnings = validate(&calendar, &Registry::ical());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, code::MISSING_REQUIRED);
        assert_eq!(warnings[0].path, ["VCALENDAR", "VTODO", "VALARM"]);
        assert_eq!(warnings[0].property.as_deref(), Some("TRIGGER"));
    }

    #[test]
    fn validation_does_not_mutate_the_tree() {
        let todo = parse(
            "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART;VALUE=DATE:20230110\r\nDUE;VALUE=DATE:20230105\r\nDURATION:P1D\r\nEND:VTODO\r\n",
        );
        let snapshot = todo.clone();
        let _ = validate(&todo, &Registry::ical());
        assert_eq!(todo, snapshot);
    }

    #[test]
    fn event_rules_mirror_todo_rules() {
        let event = parse(
            "BEGIN:VEVENT\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nDTSTART:20230110T100000Z\r\nDTEND:20230110T090000Z\r\nSTATUS:NEEDS-ACTION\r\nEND:VEVENT\r\n",
        );
        let codes = codes(&event).into_iter().sorted().collect_vec();
        assert_eq!(codes, vec![code::INVALID_STATUS, code::START_AFTER_END]);
    }

    #[test]
    fn extended_registry_applies_custom_rules() {
        let registry = Registry::ical_legacy();
        let input = "BEGIN:VTODO\r\nUID:a\r\nDTSTAMP:20230101T000000Z\r\nEXRULE:FREQ=DAILY\r\nEND:VTODO\r\n";
        let (todo, warnings) = IcalReader::from_slice(input.as_bytes())
            .with_registry(registry.clone())
            .read_one()
            .unwrap();
        assert!(warnings.is_empty());
        assert!(todo.property("EXRULE").unwrap().as_recur().is_some());
        assert!(validate(&todo, &registry).is_empty());
    }

    #[test]
    fn components_without_rules_are_passed_over() {
        let mut root = Component::new("X-ROOT");
        root.add_property(Property::text("X-A", "1"));
        assert!(validate(&root, &Registry::ical()).is_empty());
    }
}
