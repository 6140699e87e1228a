use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use crate::error::TrustFault;

/// Usage categories a `CKO_NSS_TRUST` object assigns a level to
/// (`CKA_TRUST_<PURPOSE> CK_TRUST ...`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustPurpose {
    DigitalSignature,
    NonRepudiation,
    KeyEncipherment,
    DataEncipherment,
    KeyAgreement,
    KeyCertSign,
    CrlSign,
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    IpsecEndSystem,
    IpsecTunnel,
    IpsecUser,
    TimeStamping,
}

const PURPOSES: [(&str, TrustPurpose); 15] = [
    ("DIGITAL_SIGNATURE", TrustPurpose::DigitalSignature),
    ("NON_REPUDIATION", TrustPurpose::NonRepudiation),
    ("KEY_ENCIPHERMENT", TrustPurpose::KeyEncipherment),
    ("DATA_ENCIPHERMENT", TrustPurpose::DataEncipherment),
    ("KEY_AGREEMENT", TrustPurpose::KeyAgreement),
    ("KEY_CERT_SIGN", TrustPurpose::KeyCertSign),
    ("CRL_SIGN", TrustPurpose::CrlSign),
    ("SERVER_AUTH", TrustPurpose::ServerAuth),
    ("CLIENT_AUTH", TrustPurpose::ClientAuth),
    ("CODE_SIGNING", TrustPurpose::CodeSigning),
    ("EMAIL_PROTECTION", TrustPurpose::EmailProtection),
    ("IPSEC_END_SYSTEM", TrustPurpose::IpsecEndSystem),
    ("IPSEC_TUNNEL", TrustPurpose::IpsecTunnel),
    ("IPSEC_USER", TrustPurpose::IpsecUser),
    ("TIME_STAMPING", TrustPurpose::TimeStamping),
];

impl FromStr for TrustPurpose {
    type Err = TrustFault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PURPOSES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, purpose)| *purpose)
            .ok_or_else(|| TrustFault::UnknownPurpose(s.to_string()))
    }
}

impl Display for TrustPurpose {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = PURPOSES
            .iter()
            .find(|(_, purpose)| purpose == self)
            .map_or("UNKNOWN", |(name, _)| *name);
        write!(f, "{}", name)
    }
}

const TRUSTED_DELEGATOR: &str = "TRUSTED_DELEGATOR";
const MUST_VERIFY_TRUST: &str = "MUST_VERIFY_TRUST";
const TRUSTED: &str = "TRUSTED";
const NOT_TRUSTED: &str = "NOT_TRUSTED";

/// `CKT_NSS_<LEVEL>` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustLevel {
    /// Trusted as a certificate authority.
    TrustedDelegator,
    /// Explicitly not a CA, but otherwise acceptable.
    MustVerifyTrust,
    /// Trusted for itself only, not for delegates.
    Trusted,
    NotTrusted,
}

impl FromStr for TrustLevel {
    type Err = TrustFault;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TRUSTED_DELEGATOR => Ok(TrustLevel::TrustedDelegator),
            MUST_VERIFY_TRUST => Ok(TrustLevel::MustVerifyTrust),
            TRUSTED => Ok(TrustLevel::Trusted),
            NOT_TRUSTED => Ok(TrustLevel::NotTrusted),
            _ => Err(TrustFault::UnknownLevel(s.to_string())),
        }
    }
}

impl Display for TrustLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TrustLevel::TrustedDelegator => write!(f, "{}", TRUSTED_DELEGATOR),
            TrustLevel::MustVerifyTrust => write!(f, "{}", MUST_VERIFY_TRUST),
            TrustLevel::Trusted => write!(f, "{}", TRUSTED),
            TrustLevel::NotTrusted => write!(f, "{}", NOT_TRUSTED),
        }
    }
}

/// Returns true when an upper-cased purpose/level pair marks the
/// certificate as a trusted CA: a recognised purpose at `TRUSTED_DELEGATOR`.
pub fn is_ca_trust(purpose: &str, level: &str) -> bool {
    matches!(
        (purpose.parse::<TrustPurpose>(), level.parse::<TrustLevel>()),
        (Ok(_), Ok(TrustLevel::TrustedDelegator))
    )
}
