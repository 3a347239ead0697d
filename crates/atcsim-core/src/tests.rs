#[cfg(test)]
mod tests {
    use crate::commands::*;
    use crate::constants::{FPM, FT, KTS};
    use crate::error::CommandError;
    use crate::events::{DeleteReason, SimEvent};

    #[test]
    fn test_parse_create() {
        let cmd = parse_line("CRE kl123 B738 52.3 4.8 90 FL100 250").unwrap();
        match cmd {
            ScenarioCommand::Create {
                callsign,
                actype,
                lat,
                lon,
                hdg,
                alt,
                cas,
            } => {
                assert_eq!(callsign, "KL123");
                assert_eq!(actype, "B738");
                assert_eq!(lat, 52.3);
                assert_eq!(lon, 4.8);
                assert_eq!(hdg, 90.0);
                assert!((alt - 10_000.0 * FT).abs() < 1e-9);
                assert!((cas - 250.0 * KTS).abs() < 1e-9);
            }
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_accepts_aliases_and_commas() {
        let cmd = parse_line("delete,KL123").unwrap();
        assert_eq!(
            cmd,
            ScenarioCommand::Delete {
                callsign: "KL123".into()
            }
        );
    }

    #[test]
    fn test_parse_optional_argument() {
        let cmd = parse_line("ALT KL123 FL240").unwrap();
        assert!(matches!(cmd, ScenarioCommand::Altitude { vs: None, .. }));

        let cmd = parse_line("ALT KL123 24000 2000").unwrap();
        match cmd {
            ScenarioCommand::Altitude { alt, vs: Some(vs), .. } => {
                assert!((alt - 24_000.0 * FT).abs() < 1e-9);
                assert!((vs - 2000.0 * FPM).abs() < 1e-12);
            }
            other => panic!("expected Altitude with vs, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_longitude_is_wrapped_not_rejected() {
        let cmd = parse_line("CRE AB1 A320 10 190 0 5000 200").unwrap();
        match cmd {
            ScenarioCommand::Create { lon, .. } => assert!((lon + 170.0).abs() < 1e-9),
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_latitude() {
        let err = parse_line("CRE AB1 A320 95 4 0 5000 200").unwrap_err();
        assert!(matches!(err, CommandError::BadValue { arg: "lat", .. }));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_line("   "), Err(CommandError::Empty));
        assert!(matches!(
            parse_line("FLY KL123"),
            Err(CommandError::UnknownCommand(name)) if name == "FLY"
        ));
        assert!(matches!(
            parse_line("HDG KL123"),
            Err(CommandError::MissingArgument { command: "HDG", arg: "hdg" })
        ));
        assert!(matches!(
            parse_line("UCO KL123 EXTRA"),
            Err(CommandError::TooManyArguments { command: "UCO" })
        ));
    }

    #[test]
    fn test_parse_replay_keeps_path_case() {
        let cmd = parse_line("REPLAY POLAR data/Schiphol 00:10:00").unwrap();
        assert_eq!(
            cmd,
            ScenarioCommand::Replay {
                source_type: "polar".into(),
                dataset: "data/Schiphol".into(),
                start_time: Some(600.0),
            }
        );
    }

    #[test]
    fn test_every_descriptor_has_usage() {
        for desc in COMMANDS {
            assert!(desc.usage().starts_with(desc.name));
            assert!(descriptor(desc.name).is_some());
            for alias in desc.aliases {
                assert_eq!(descriptor(alias).map(|d| d.name), Some(desc.name));
            }
        }
    }

    #[test]
    fn test_timestamps() {
        assert_eq!(parse_timestamp("00:01:30").unwrap(), 90.0);
        assert_eq!(parse_timestamp("01:00:00.5").unwrap(), 3600.5);
        assert_eq!(parse_timestamp("12.5").unwrap(), 12.5);
        assert!(parse_timestamp("ab:cd").is_err());
        assert_eq!(format_timestamp(3725.5), "01:02:05.50");
    }

    #[test]
    fn test_parse_scenario_sorts_stably() {
        let text = "\
# demo
00:00:10.00>HDG KL123 180
00:00:00.00>CRE KL123 B738 52.3 4.8 90 FL100 250
00:00:10.00>SPD KL123 220
";
        let cmds = parse_scenario(text).unwrap();
        assert_eq!(cmds.len(), 3);
        assert!(cmds[0].command.is_creation());
        assert!(matches!(cmds[1].command, ScenarioCommand::Heading { .. }));
        assert!(matches!(cmds[2].command, ScenarioCommand::Speed { .. }));
    }

    #[test]
    fn test_parse_scenario_reports_line() {
        let text = "00:00:00>CRE KL123 B738 52.3 4.8 90 FL100 250\nbroken line\n";
        match parse_scenario(text) {
            Err(CommandError::Line { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected line error, got {other:?}"),
        }
    }

    #[test]
    fn test_command_json_is_tagged() {
        let cmd = ScenarioCommand::AddReplay {
            callsign: "KL123".into(),
        };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"AddReplay\""), "{json}");
        let back: ScenarioCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
        assert_eq!(back.callsign(), Some("KL123"));
    }

    #[test]
    fn test_event_json_is_tagged() {
        let ev = SimEvent::AircraftDeleted {
            callsign: "KL123".into(),
            reason: DeleteReason::CoastTimeout,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert!(json.contains("\"type\":\"AircraftDeleted\""), "{json}");
    }
}
