//! # Capabilities
//!
//! Named capabilities guarding the campaign content type, and their grant to host
//! roles on activation.

use tracing::info;

use crate::error::CampaignResult;
use crate::host::ContentHost;

pub const EDIT_CAMPAIGN: &str = "edit_adbutler_campaign";
pub const READ_CAMPAIGN: &str = "read_adbutler_campaign";
pub const DELETE_CAMPAIGN: &str = "delete_adbutler_campaign";
pub const EDIT_CAMPAIGNS: &str = "edit_adbutler_campaigns";
pub const EDIT_OTHERS_CAMPAIGNS: &str = "edit_others_adbutler_campaigns";
pub const PUBLISH_CAMPAIGNS: &str = "publish_adbutler_campaigns";
pub const READ_PRIVATE_CAMPAIGNS: &str = "read_private_adbutler_campaigns";

/// Capability that lets a user upload creatives, and so become an advertiser
pub const EDIT_CREATIVES: &str = "edit_adbutler_creatives";

/// Roles that receive the full capability set
pub const FULL_ROLES: [&str; 2] = ["administrator", "editor"];

/// Role that receives the reduced capability set
pub const LIMITED_ROLE: &str = "contributor";

/// Generic content capability names mapped to their campaign-specific names
pub fn capabilities() -> Vec<(&'static str, &'static str)> {
    vec![
        ("edit_post", EDIT_CAMPAIGN),
        ("read_post", READ_CAMPAIGN),
        ("delete_post", DELETE_CAMPAIGN),
        ("edit_posts", EDIT_CAMPAIGNS),
        ("edit_others_posts", EDIT_OTHERS_CAMPAIGNS),
        ("publish_posts", PUBLISH_CAMPAIGNS),
        ("read_private_posts", READ_PRIVATE_CAMPAIGNS),
    ]
}

/// Every campaign capability
pub fn full() -> Vec<&'static str> {
    capabilities().into_iter().map(|(_, cap)| cap).collect()
}

/// Campaign capabilities without editing others, publishing or private reads
pub fn limited() -> Vec<&'static str> {
    full()
        .into_iter()
        .filter(|cap| {
            ![EDIT_OTHERS_CAMPAIGNS, PUBLISH_CAMPAIGNS, READ_PRIVATE_CAMPAIGNS].contains(cap)
        })
        .collect()
}

/// Grant capabilities on plugin activation.
///
/// `additional_roles` receive the reduced set alongside the contributor role.
pub async fn activate(host: &dyn ContentHost, additional_roles: &[String]) -> CampaignResult<()> {
    let full = full();
    for role in FULL_ROLES {
        host.grant_capabilities(role, &full).await?;
    }

    let limited = limited();
    host.grant_capabilities(LIMITED_ROLE, &limited).await?;
    for role in additional_roles {
        host.grant_capabilities(role, &limited).await?;
    }

    info!(
        "Granted campaign capabilities to {} roles",
        FULL_ROLES.len() + 1 + additional_roles.len()
    );
    Ok(())
}

/// Revoke every campaign capability on plugin deactivation
pub async fn deactivate(host: &dyn ContentHost, additional_roles: &[String]) -> CampaignResult<()> {
    let full = full();
    let roles = FULL_ROLES
        .iter()
        .copied()
        .chain(std::iter::once(LIMITED_ROLE))
        .chain(additional_roles.iter().map(String::as_str));

    for role in roles {
        host.revoke_capabilities(role, &full).await?;
    }

    info!("Revoked campaign capabilities");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::campaign::User;
    use crate::host::MemoryHost;

    #[test]
    fn test_limited_set() {
        let limited = limited();
        assert_eq!(limited.len(), 4);
        assert!(limited.contains(&EDIT_CAMPAIGN));
        assert!(!limited.contains(&PUBLISH_CAMPAIGNS));
    }

    #[tokio::test]
    async fn test_activate_and_deactivate() {
        let host = MemoryHost::new()
            .with_user(User::new(1, "admin", "admin@example.com"), &["administrator"])
            .with_user(User::new(2, "writer", "writer@example.com"), &["contributor"])
            .with_user(User::new(3, "seller", "seller@example.com"), &["vendor"]);

        activate(&host, &["vendor".to_string()]).await.unwrap();

        assert!(host.user_can(1, PUBLISH_CAMPAIGNS).await);
        assert!(host.user_can(2, EDIT_CAMPAIGN).await);
        assert!(!host.user_can(2, PUBLISH_CAMPAIGNS).await);
        assert!(host.user_can(3, EDIT_CAMPAIGNS).await);
        assert!(!host.user_can(3, READ_PRIVATE_CAMPAIGNS).await);

        deactivate(&host, &["vendor".to_string()]).await.unwrap();

        assert!(!host.user_can(1, EDIT_CAMPAIGN).await);
        assert!(!host.user_can(2, EDIT_CAMPAIGN).await);
        assert!(!host.user_can(3, EDIT_CAMPAIGN).await);
    }
}
