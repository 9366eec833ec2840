use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub password: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            password: SecretString::default(),
        }
    }

    pub fn set_password(&mut self, password: SecretString) {
        self.password = password;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let api_url = "https://api.promptdeck.dev".to_string();
        let args = GlobalArgs::new(api_url);
        assert_eq!(args.api_url, "https://api.promptdeck.dev");
        assert_eq!(args.password.expose_secret(), "");
    }
}
