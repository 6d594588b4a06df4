use studiq_result::Result;

/// Characters allowed in a base58 encoded wallet address
static BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

auto_derived!(
    /// User as reported by the auth provider after a wallet sign-in
    pub struct AuthUser {
        /// Id assigned by the auth provider
        pub auth_id: String,
        /// Address of the wallet the user signed in with
        pub wallet_address: String,
        /// Linked email address
        pub email: Option<String>,
        /// Name the user chose with the auth provider
        pub display_name: Option<String>,
        /// Avatar the user chose with the auth provider
        pub avatar_url: Option<String>,
    }
);

/// Check that a wallet address looks like a Solana public key
pub fn validate_wallet_address(address: &str) -> Result<()> {
    if (32..=44).contains(&address.len())
        && address.chars().all(|c| BASE58_ALPHABET.contains(c))
    {
        Ok(())
    } else {
        Err(create_error!(InvalidWalletAddress))
    }
}

/// Shorten a wallet address to its first and last four characters
pub fn shorten_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 8 {
        return address.to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Pick a display name for a user who has not set one
pub fn derive_display_name(user: &AuthUser) -> String {
    if let Some(name) = user
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        return name.to_string();
    }

    if let Some(local) = user
        .email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
    {
        return local.to_string();
    }

    format!("Student {}", shorten_address(&user.wallet_address))
}

/// Up to two upper-case initials for a display name
pub fn avatar_initials(display_name: &str) -> String {
    let initials: String = display_name
        .split(|c: char| c.is_whitespace() || matches!(c, '.' | '_' | '-'))
        .filter_map(|word| word.chars().find(|c| c.is_alphanumeric()))
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}
