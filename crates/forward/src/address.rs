//! `platform:channel_id` address codec.
//!
//! Both platform names and channel ids may contain `:`, so the split point is
//! found by matching the longest known platform name as a literal prefix.
//! Without a match the address is split at the first `:`.

use crosslink_channels::ChannelRef;

/// Parse an address against the names of the currently active platforms.
pub fn parse_address<S: AsRef<str>>(address: &str, platforms: &[S]) -> Option<ChannelRef> {
    let mut known: Vec<&str> = platforms
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.is_empty())
        .collect();
    known.sort_by_key(|p| std::cmp::Reverse(p.len()));

    let matched = known.into_iter().find_map(|platform| {
        address
            .strip_prefix(platform)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|channel_id| (platform, channel_id))
    });
    let (platform, channel_id) = matched.or_else(|| address.split_once(':'))?;

    if platform.is_empty() || channel_id.is_empty() {
        return None;
    }
    Some(ChannelRef::new(platform, channel_id))
}

/// Inverse of [`parse_address`].
pub fn format_address(channel: &ChannelRef) -> String {
    format!("{}:{}", channel.platform, channel.channel_id)
}
