//! User details a relying party can ask for, and how they map onto completion data.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rp::CompletionData;

/// Details released to the relying party when an order completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserDetailType {
    FirstName,
    LastName,
    Name,
    PersonalNumber,
    IpAddress,
    IssueDate,
}

/// Released when nothing else is configured.
pub const DEFAULT_DETAILS: [UserDetailType; 2] =
    [UserDetailType::FirstName, UserDetailType::LastName];

impl UserDetailType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserDetailType::FirstName => "firstName",
            UserDetailType::LastName => "lastName",
            UserDetailType::Name => "name",
            UserDetailType::PersonalNumber => "personalNumber",
            UserDetailType::IpAddress => "ipAddress",
            UserDetailType::IssueDate => "issueDate",
        }
    }

    /// Human readable label used in the text shown in the app.
    pub fn description(&self) -> &'static str {
        match self {
            UserDetailType::FirstName => "First name",
            UserDetailType::LastName => "Last name",
            UserDetailType::Name => "Full name",
            UserDetailType::PersonalNumber => "Personal identity number",
            UserDetailType::IpAddress => "IP address",
            UserDetailType::IssueDate => "BankID issue date",
        }
    }

    fn value(&self, data: &CompletionData) -> String {
        match self {
            UserDetailType::FirstName => data.user.given_name.clone(),
            UserDetailType::LastName => data.user.surname.clone(),
            UserDetailType::Name => data.user.name.clone(),
            UserDetailType::PersonalNumber => data.user.personal_number.clone(),
            UserDetailType::IpAddress => data.device.ip_address.clone(),
            UserDetailType::IssueDate => data.bank_id_issue_date.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct UserDetailParseError(String);

impl fmt::Display for UserDetailParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown user detail: {}", self.0)
    }
}

impl std::error::Error for UserDetailParseError {}

impl FromStr for UserDetailType {
    type Err = UserDetailParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "firstName" => Ok(UserDetailType::FirstName),
            "lastName" => Ok(UserDetailType::LastName),
            "name" => Ok(UserDetailType::Name),
            "personalNumber" => Ok(UserDetailType::PersonalNumber),
            "ipAddress" => Ok(UserDetailType::IpAddress),
            "issueDate" => Ok(UserDetailType::IssueDate),
            other => Err(UserDetailParseError(other.to_string())),
        }
    }
}

impl fmt::Display for UserDetailType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Project completion data onto the requested details, falling back to
/// [`DEFAULT_DETAILS`] when nothing is requested.
pub fn user_details(
    requested: &[UserDetailType],
    data: &CompletionData,
) -> BTreeMap<UserDetailType, String> {
    let requested = if requested.is_empty() {
        &DEFAULT_DETAILS[..]
    } else {
        requested
    };
    requested
        .iter()
        .map(|detail| (*detail, detail.value(data)))
        .collect()
}
