use std::io::{BufRead, Write};

use cabundle::{decoder::Decoder, encoder::Encoder};
use log::{debug, info};
use pem::{EncodeOptions, Pem};

use crate::{
    Options,
    error::{Error, ValueFault},
    label::Banner,
    matcher::Matchers,
    octal::OctalLine,
    tokenizer::{CleanLine, Line, Tokenizer},
    trust,
    writer::BundleWriter,
};

/*
* idle -> awaiting label -> awaiting value -> accumulating value -+
*               ^                                                 |
*               |   accumulating trust <- awaiting trust <--------+
*               |          |
*   certificate-class line cancels any open record (except inside a value block)
*   qualifying trust pair writes the record and returns to idle
 */
#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    AwaitingLabel,
    AwaitingValue {
        banner: Banner,
    },
    AccumulatingValue {
        banner: Banner,
        raw: Vec<u8>,
    },
    AwaitingTrust {
        banner: Banner,
        segments: Vec<String>,
    },
    AccumulatingTrust {
        banner: Banner,
        segments: Vec<String>,
    },
}

impl State {
    fn banner(&self) -> Option<&Banner> {
        match self {
            State::Idle | State::AwaitingLabel => None,
            State::AwaitingValue { banner }
            | State::AccumulatingValue { banner, .. }
            | State::AwaitingTrust { banner, .. }
            | State::AccumulatingTrust { banner, .. } => Some(banner),
        }
    }
}

/// Counters reported at the end of a conversion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Physical lines read.
    pub lines: usize,
    /// Certificate objects seen.
    pub certificates: usize,
    /// Certificates written to the bundle.
    pub written: usize,
    /// Open records dropped because a new certificate object started.
    pub canceled: usize,
}

/// Drives the certificate/trust record state machine over cleaned lines
/// and writes every certificate trusted as a CA.
///
/// Only one record is open at a time. It is dropped when a new certificate
/// object starts, and written once a trust line marks it as a CA.
pub struct Converter<W: Write> {
    matchers: Matchers,
    writer: BundleWriter<W>,
    state: State,
    summary: Summary,
}

impl<W: Write> Converter<W> {
    pub fn new(output: W, options: Options) -> Result<Self, Error> {
        Ok(Converter {
            matchers: Matchers::new()?,
            writer: BundleWriter::new(output, options.include_label),
            state: State::Idle,
            summary: Summary::default(),
        })
    }

    /// Processes the whole input. Stops at the first error; entries
    /// written before it stay in the output.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<Summary, Error> {
        for line in Tokenizer::new(input) {
            self.feed(&line?)?;
        }
        if let Some(banner) = self.state.banner() {
            debug!("end of input, discarding \"{}\"", banner.label());
        }
        self.state = State::Idle;
        Ok(self.summary())
    }

    pub fn feed(&mut self, line: &CleanLine) -> Result<(), Error> {
        self.summary.lines = line.number;
        let state = std::mem::take(&mut self.state);
        self.state = self.step(state, line)?;
        Ok(())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            written: self.writer.written(),
            ..self.summary
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn step(&mut self, state: State, line: &CleanLine) -> Result<State, Error> {
        let number = line.number;
        let text = match &line.line {
            Line::Content(text) => text.as_str(),
            Line::Blank => {
                // value blocks must be contiguous
                return match state {
                    State::AccumulatingValue { .. } => Err(Error::MalformedValue {
                        line: number,
                        reason: ValueFault::Interrupted,
                    }),
                    other => Ok(other),
                };
            }
        };

        match state {
            State::Idle => {
                if self.matchers.certificate.is_match(text) {
                    self.summary.certificates += 1;
                    return Ok(State::AwaitingLabel);
                }
                Ok(State::Idle)
            }
            State::AccumulatingValue { banner, mut raw } => {
                if self.matchers.end.is_match(text) {
                    let segments = encode(raw)
                        .map_err(|source| Error::Encode { line: number, source })?;
                    return Ok(State::AwaitingTrust { banner, segments });
                }
                let bytes: Vec<u8> = OctalLine::new(text, &self.matchers.octet)
                    .decode()
                    .map_err(|reason| Error::MalformedValue {
                        line: number,
                        reason,
                    })?;
                raw.extend_from_slice(&bytes);
                Ok(State::AccumulatingValue { banner, raw })
            }
            open if self.matchers.certificate.is_match(text) => {
                match open.banner() {
                    Some(banner) => debug!(
                        "canceling \"{}\", found non CA at line {}",
                        banner.label(),
                        number
                    ),
                    None => debug!("canceling unlabeled certificate at line {}", number),
                }
                self.summary.canceled += 1;
                self.summary.certificates += 1;
                Ok(State::AwaitingLabel)
            }
            State::AwaitingLabel => {
                let Some(captures) = self.matchers.label.captures(text) else {
                    return Ok(State::AwaitingLabel);
                };
                let raw = captures.get(1).map_or("", |m| m.as_str());
                let banner = Banner::from_escaped(raw).map_err(|reason| Error::ReadLabel {
                    line: number,
                    reason,
                })?;
                info!("certificate on line {}: \"{}\"", number, banner.label());
                Ok(State::AwaitingValue { banner })
            }
            State::AwaitingValue { banner } => {
                if self.matchers.value.is_match(text) {
                    return Ok(State::AccumulatingValue {
                        banner,
                        raw: Vec::new(),
                    });
                }
                Ok(State::AwaitingValue { banner })
            }
            State::AwaitingTrust { banner, segments } => {
                if self.matchers.trust.is_match(text) {
                    return Ok(State::AccumulatingTrust { banner, segments });
                }
                Ok(State::AwaitingTrust { banner, segments })
            }
            State::AccumulatingTrust { banner, segments } => {
                let Some(captures) = self.matchers.trust_pair.captures(text) else {
                    return Ok(State::AccumulatingTrust { banner, segments });
                };
                let purpose = captures
                    .get(1)
                    .ok_or(Error::TrustRead { line: number })?
                    .as_str()
                    .to_uppercase();
                let level = captures
                    .get(2)
                    .ok_or(Error::TrustRead { line: number })?
                    .as_str()
                    .to_uppercase();

                if trust::is_ca_trust(&purpose, &level) {
                    self.writer.write_certificate(&banner, &segments)?;
                    info!("saved \"{}\" ({} {})", banner.label(), purpose, level);
                    return Ok(State::Idle);
                }
                debug!("\"{}\": {} {} does not qualify", banner.label(), purpose, level);
                Ok(State::AccumulatingTrust { banner, segments })
            }
        }
    }
}

fn encode(raw: Vec<u8>) -> Result<Vec<String>, pem::error::Error> {
    let pem: Pem = raw.encode()?;
    pem.segments(EncodeOptions::default())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::str::FromStr;

    use cabundle::decoder::Decoder;
    use pem::Pem;

    use crate::error::{Error, LabelFault, ValueFault};
    use crate::{Options, Summary, convert};

    const TEST_PEM_CERT: &str = r"-----BEGIN CERTIFICATE-----
MIICLDCCAdKgAwIBAgIBADAKBggqhkjOPQQDAjB9MQswCQYDVQQGEwJCRTEPMA0G
A1UEChMGR251VExTMSUwIwYDVQQLExxHbnVUTFMgY2VydGlmaWNhdGUgYXV0aG9y
aXR5MQ8wDQYDVQQIEwZMZXV2ZW4xJTAjBgNVBAMTHEdudVRMUyBjZXJ0aWZpY2F0
ZSBhdXRob3JpdHkwHhcNMTEwNTIzMjAzODIxWhcNMTIxMjIyMDc0MTUxWjB9MQsw
CQYDVQQGEwJCRTEPMA0GA1UEChMGR251VExTMSUwIwYDVQQLExxHbnVUTFMgY2Vy
dGlmaWNhdGUgYXV0aG9yaXR5MQ8wDQYDVQQIEwZMZXV2ZW4xJTAjBgNVBAMTHEdu
dVRMUyBjZXJ0aWZpY2F0ZSBhdXRob3JpdHkwWTATBgcqhkjOPQIBBggqhkjOPQMB
BwNCAARS2I0jiuNn14Y2sSALCX3IybqiIJUvxUpj+oNfzngvj/Niyv2394BWnW4X
uQ4RTEiywK87WRcWMGgJB5kX/t2no0MwQTAPBgNVHRMBAf8EBTADAQH/MA8GA1Ud
DwEB/wQFAwMHBgAwHQYDVR0OBBYEFPC0gf6YEr+1KLlkQAPLzB9mTigDMAoGCCqG
SM49BAMCA0gAMEUCIDGuwD1KPyG+hRf88MeyMQcqOFZD0TbVleF+UsAGQ4enAiEA
l4wOuDwKQa+upc8GftXE2C//4mKANBC6It01gUaTIpo=
-----END CERTIFICATE-----";

    const CA: &str = "CKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED_DELEGATOR";
    const NOT_TRUSTED: &str = "CKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_NOT_TRUSTED";
    const MUST_VERIFY: &str = "CKA_TRUST_EMAIL_PROTECTION CK_TRUST CKT_NSS_MUST_VERIFY_TRUST";

    fn test_der() -> Vec<u8> {
        Pem::from_str(TEST_PEM_CERT).unwrap().decode().unwrap()
    }

    fn octal_lines(der: &[u8]) -> String {
        der.chunks(16)
            .map(|chunk| {
                chunk
                    .iter()
                    .map(|b| format!("\\{:03o}", b))
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// A certificate object and its trust object, laid out like certdata.txt.
    fn certificate(label: &str, der: &[u8], trust: &[&str]) -> String {
        format!(
            r#"
#
# Certificate "{label}"
#
CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE
CKA_TOKEN CK_BBOOL CK_TRUE
CKA_PRIVATE CK_BBOOL CK_FALSE
CKA_MODIFIABLE CK_BBOOL CK_FALSE
CKA_LABEL UTF8 "{label}"
CKA_CERTIFICATE_TYPE CK_CERTIFICATE_TYPE CKC_X_509
CKA_SUBJECT MULTILINE_OCTAL
\060\032\061\030
END
CKA_ID UTF8 "0"
CKA_VALUE MULTILINE_OCTAL
{value}
END
CKA_NSS_MOZILLA_CA_POLICY CK_BBOOL CK_TRUE

# Trust for "{label}"
CKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST
CKA_TOKEN CK_BBOOL CK_TRUE
CKA_LABEL UTF8 "{label}"
CKA_CERT_SHA1_HASH MULTILINE_OCTAL
\001\002\003
END
{trust}
CKA_TRUST_STEP_UP_APPROVED CK_BBOOL CK_FALSE
"#,
            label = label,
            value = octal_lines(der),
            trust = trust.join("\n"),
        )
    }

    fn run(input: &str, options: Options) -> (Result<Summary, Error>, String) {
        let mut output = Vec::new();
        let result = convert(input.as_bytes(), &mut output, options);
        (result, String::from_utf8(output).unwrap())
    }

    fn blocks(output: &str) -> Vec<Pem> {
        output
            .split_inclusive("-----END CERTIFICATE-----\n")
            .map(|block| Pem::from_str(block).unwrap())
            .collect()
    }

    #[test]
    fn test_single_ca_certificate() {
        let der = test_der();
        let input = certificate("GnuTLS Test CA", &der, &[CA]);
        let (result, output) = run(&input, Options::default());

        let summary = result.unwrap();
        assert_eq!(1, summary.certificates);
        assert_eq!(1, summary.written);
        assert_eq!(0, summary.canceled);
        assert!(output.starts_with("\nGnuTLS Test CA\n==============\n-----BEGIN CERTIFICATE-----\n"));
        assert!(output.ends_with(&format!("{}\n", TEST_PEM_CERT)));

        let pems = blocks(&output);
        assert_eq!(1, pems.len());
        assert_eq!(der, pems[0].data());
    }

    #[test]
    fn test_without_label() {
        let input = certificate("GnuTLS Test CA", &test_der(), &[CA]);
        let (result, output) = run(
            &input,
            Options {
                include_label: false,
            },
        );

        assert_eq!(1, result.unwrap().written);
        assert_eq!(format!("\n{}\n", TEST_PEM_CERT), output);
    }

    #[rstest(
        trust,
        expected,
        case(vec![CA], 1),
        case(vec![NOT_TRUSTED], 0),
        case(vec![MUST_VERIFY], 0),
        case(vec!["CKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED"], 0),
        case(vec![NOT_TRUSTED, MUST_VERIFY, CA], 1),
        case(vec![CA, "CKA_TRUST_EMAIL_PROTECTION CK_TRUST CKT_NSS_TRUSTED_DELEGATOR"], 1),
        case(vec!["cka_trust_code_signing ck_trust ckt_nss_trusted_delegator"], 1),
        case(vec!["CKA_TRUST_STEP_UP_APPROVED CK_TRUST CKT_NSS_TRUSTED_DELEGATOR"], 0)
    )]
    fn test_trust_gating(trust: Vec<&str>, expected: usize) {
        let input = certificate("Gated", &test_der(), &trust);
        let (result, output) = run(&input, Options::default());

        assert_eq!(expected, result.unwrap().written);
        assert_eq!(expected, output.matches("-----BEGIN CERTIFICATE-----").count());
    }

    #[test]
    fn test_cancel_on_new_certificate() {
        let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\n";
        let (result, output) = run(input, Options::default());

        let summary = result.unwrap();
        assert_eq!(2, summary.certificates);
        assert_eq!(1, summary.canceled);
        assert_eq!(0, summary.written);
        assert!(output.is_empty());
    }

    #[test]
    fn test_cancel_discards_partial_record() {
        let der = test_der();
        // the first certificate never gets a trust object
        let partial = certificate("Partial", &der, &[]).replace("CKO_NSS_TRUST", "CKO_NSS_BUILTIN_ROOT_LIST");
        let input = format!("{}{}", partial, certificate("Complete", &der, &[CA]));
        let (result, output) = run(&input, Options::default());

        let summary = result.unwrap();
        assert_eq!(1, summary.canceled);
        assert_eq!(1, summary.written);
        assert!(!output.contains("Partial"));
        assert!(output.starts_with("\nComplete\n========\n"));
    }

    #[test]
    fn test_ordering() {
        let der = test_der();
        let input = format!(
            "{}{}{}",
            certificate("Alpha", &der, &[CA]),
            certificate("Skipped", &der, &[NOT_TRUSTED]),
            certificate("Beta", &der, &[CA])
        );
        let (result, output) = run(&input, Options::default());

        assert_eq!(2, result.unwrap().written);
        let alpha = output.find("Alpha").unwrap();
        let beta = output.find("Beta").unwrap();
        assert!(alpha < beta);
        assert!(!output.contains("Skipped"));
        assert_eq!(2, blocks(&output).len());
    }

    #[rstest(
        label,
        expected_banner,
        case(r"It\x27s Trusted", "It's Trusted\n============\n"),
        case(r"T\xC3\x9CRKTRUST CA", "TÜRKTRUST CA\n============\n"),
        case(r"Back\slash", "Back\\slash\n==========\n")
    )]
    fn test_label_banner(label: &str, expected_banner: &str) {
        let input = certificate(label, &test_der(), &[CA]);
        let (result, output) = run(&input, Options::default());

        assert_eq!(1, result.unwrap().written);
        assert!(output.starts_with(&format!("\n{}-----BEGIN", expected_banner)));
    }

    #[test]
    fn test_malformed_value_keeps_written_blocks() {
        let first = certificate("Kept", &test_der(), &[CA]);
        let bad = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_LABEL UTF8 \"Broken\"\nCKA_VALUE MULTILINE_OCTAL\n\\060\\202\n\\12\\345\nEND\n";
        let input = format!("{}{}", first, bad);
        let bad_line = first.lines().count() + 5;
        let (result, output) = run(&input, Options::default());

        match result {
            Err(Error::MalformedValue { line, reason }) => {
                assert_eq!(bad_line, line);
                assert_eq!(ValueFault::InvalidGroup("12".to_string()), reason);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        let pems = blocks(&output);
        assert_eq!(1, pems.len());
        assert!(output.contains("Kept"));
        assert!(!output.contains("Broken"));
    }

    #[rstest(
        interruption,
        case(""),
        case("   "),
        case("# comment")
    )]
    fn test_interrupted_value(interruption: &str) {
        let input = format!(
            "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_LABEL UTF8 \"X\"\nCKA_VALUE MULTILINE_OCTAL\n\\101\n{}\n\\102\nEND\n",
            interruption
        );
        let (result, _) = run(&input, Options::default());

        assert!(matches!(
            result,
            Err(Error::MalformedValue {
                line: 5,
                reason: ValueFault::Interrupted
            })
        ));
    }

    #[test]
    fn test_certificate_line_inside_value() {
        let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_LABEL UTF8 \"X\"\nCKA_VALUE MULTILINE_OCTAL\nCKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\n";
        let (result, _) = run(input, Options::default());

        assert!(matches!(
            result,
            Err(Error::MalformedValue {
                line: 4,
                reason: ValueFault::InvalidGroup(_)
            })
        ));
    }

    #[test]
    fn test_empty_label() {
        let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_LABEL UTF8 \"\"\n";
        let (result, _) = run(input, Options::default());

        assert!(matches!(
            result,
            Err(Error::ReadLabel {
                line: 2,
                reason: LabelFault::Empty
            })
        ));
        assert_eq!(2, result.unwrap_err().exit_code());
    }

    #[test]
    fn test_empty_value() {
        let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_LABEL UTF8 \"X\"\nCKA_VALUE MULTILINE_OCTAL\nEND\n";
        let (result, _) = run(input, Options::default());

        assert!(matches!(
            result,
            Err(Error::Encode {
                line: 4,
                source: pem::error::Error::MissingData
            })
        ));
    }

    #[test]
    fn test_lines_outside_certificate_are_ignored() {
        let input = "BEGINDATA\nCKA_LABEL UTF8 \"\"\nCKA_VALUE MULTILINE_OCTAL\n\\12\\345\n\nCKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST\nCKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED_DELEGATOR\n";
        let (result, output) = run(input, Options::default());

        let summary = result.unwrap();
        assert_eq!(7, summary.lines);
        assert_eq!(0, summary.certificates);
        assert!(output.is_empty());
    }

    #[test]
    fn test_value_before_label_is_ignored() {
        let input = "CKA_CLASS CK_OBJECT_CLASS CKO_CERTIFICATE\nCKA_VALUE MULTILINE_OCTAL\n\\101\nEND\nCKA_CLASS CK_OBJECT_CLASS CKO_NSS_TRUST\nCKA_TRUST_SERVER_AUTH CK_TRUST CKT_NSS_TRUSTED_DELEGATOR\n";
        let (result, output) = run(input, Options::default());

        assert_eq!(0, result.unwrap().written);
        assert!(output.is_empty());
    }

    #[rstest(len, case(1), case(47), case(48), case(49), case(100), case(1500))]
    fn test_value_roundtrip(len: usize) {
        let der = (0..len).map(|i| (i * 7 % 256) as u8).collect::<Vec<u8>>();
        let input = certificate("Roundtrip", &der, &[CA]);
        let (result, output) = run(&input, Options::default());

        assert_eq!(1, result.unwrap().written);
        assert!(
            output
                .lines()
                .all(|l| l.len() <= pem::LINE_CHARS || l.starts_with("-----"))
        );
        assert_eq!(der, blocks(&output)[0].data());
    }
}
