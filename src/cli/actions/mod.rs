pub mod login;

#[derive(Debug)]
pub enum Action {
    Login { identifier: String, remember: bool },
}
