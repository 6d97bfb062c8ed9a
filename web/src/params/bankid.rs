use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub(crate) struct StartParams {
    /// `true` when the BankID app runs on the same device as the browser. Defaults to `true`.
    #[param(example = "false")]
    pub(crate) same: Option<String>,
}

impl StartParams {
    /// Anything other than a parsable `false` means same device.
    pub(crate) fn same_device(&self) -> bool {
        self.same
            .as_deref()
            .and_then(|same| same.trim().parse::<bool>().ok())
            .unwrap_or(true)
    }
}
