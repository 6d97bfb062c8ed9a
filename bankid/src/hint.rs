//! Hint codes and the user facing messages recommended for them.

use serde::{Deserialize, Serialize};

/// Recommended user messages, keyed by their RFA identifier.
static MESSAGES: &[(&str, &str)] = &[
    ("RFA1", "Start your BankID app."),
    ("RFA3", "Action cancelled. Please try again."),
    ("RFA4", "An identification or signing for this personal number is already started. Please try again."),
    ("RFA5", "Internal error. Please try again."),
    ("RFA6", "Action cancelled."),
    ("RFA8", "The BankID app is not responding. Please check that it's started and that you have internet access. If you don't have a valid BankID you can get one from your bank. Try again."),
    ("RFA9", "Enter your security code in the BankID app and select Identify or Sign."),
    ("RFA13", "Trying to start your BankID app."),
    ("RFA14", "Searching for BankID, it may take a little while... If a few seconds have passed and still no BankID has been found, you probably don't have a BankID which can be used for this identification/signing on this computer. If you have a BankID card, please insert it into your card reader. If you don't have a BankID you can get one from your bank. If you have a BankID on another device you can start the BankID app on that device."),
    ("RFA15", "Searching for BankID:s, it may take a little while... If a few seconds have passed and still no BankID has been found, you probably don't have a BankID which can be used for this identification/signing on this computer. If you have a BankID card, please insert it into your card reader. If you don't have a BankID you can get one from your bank."),
    ("RFA16", "The BankID you are trying to use is blocked or too old. Please use another BankID or get a new one from your bank."),
    ("RFA17", "The BankID app couldn't be found on your computer or mobile device. Please install it and get a BankID from your bank. Install the app from your app store or https://install.bankid.com."),
    ("RFA18", "Start the BankID app."),
    ("RFA19", "Would you like to identify yourself or sign with a BankID on this computer, or with a Mobile BankID?"),
    ("RFA20", "Would you like to identify yourself or sign with a BankID on this computer, or with a BankID on another device?"),
    ("RFA21", "Identification or signing in progress."),
    ("RFA22", "Unknown error. Please try again."),
    ("RFA23", "Process your machine-readable travel document using the BankID app."),
];

/// Message used for any hint code without a specific recommendation.
pub const FALLBACK_RFA: &str = "RFA22";

/// Look up a message by RFA identifier.
pub fn rfa(id: &str) -> Option<&'static str> {
    MESSAGES
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, message)| *message)
}

fn fallback_message() -> &'static str {
    // RFA22 is part of the static table above.
    rfa(FALLBACK_RFA).unwrap_or("Unknown error. Please try again.")
}

/// Sub-status reported by collect for pending and failed orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HintCode {
    OutstandingTransaction,
    NoClient,
    Started,
    UserMrtd,
    UserCallConfirm,
    UserSign,
    ExpiredTransaction,
    CertificateErr,
    UserCancel,
    Cancelled,
    StartFailed,
    UserDeclinedCall,
    #[default]
    #[serde(other)]
    Unknown,
}

impl HintCode {
    /// RFA identifier of the message to show for this hint.
    pub fn rfa(&self) -> &'static str {
        match self {
            HintCode::OutstandingTransaction => "RFA13",
            HintCode::NoClient => "RFA1",
            HintCode::Started => "RFA15",
            HintCode::UserMrtd => "RFA23",
            HintCode::UserSign => "RFA9",
            HintCode::ExpiredTransaction => "RFA8",
            HintCode::CertificateErr => "RFA16",
            HintCode::UserCancel => "RFA6",
            HintCode::Cancelled => "RFA3",
            HintCode::StartFailed => "RFA17",
            HintCode::UserCallConfirm | HintCode::UserDeclinedCall | HintCode::Unknown => {
                FALLBACK_RFA
            }
        }
    }

    /// User facing message. Never empty.
    pub fn message(&self) -> &'static str {
        rfa(self.rfa()).unwrap_or_else(fallback_message)
    }
}
