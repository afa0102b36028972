//! Shared netlink link helpers

use futures::stream::TryStreamExt;
use netlink_packet_route::link::{InfoKind, LinkAttribute, LinkInfo, LinkMessage};
use rtnetlink::Handle;

use burrow_core::{Error, Result};

/// Look up a link by name, mapping the kernel's "no such device" reply to
/// `None` and any other failure to a network error.
pub(crate) async fn find_link(handle: &Handle, name: &str) -> Result<Option<LinkMessage>> {
    let mut links = handle.link().get().match_name(name.to_string()).execute();

    match links.try_next().await {
        Ok(link) => Ok(link),
        Err(rtnetlink::Error::NetlinkError(msg)) if msg.raw_code() == -libc::ENODEV => Ok(None),
        Err(e) => Err(Error::network("link lookup", e)),
    }
}

/// Look up a link that must exist in the current namespace
pub(crate) async fn expect_link(handle: &Handle, name: &str) -> Result<LinkMessage> {
    find_link(handle, name).await?.ok_or_else(|| Error::LinkNotFound {
        name: name.to_string(),
    })
}

/// Whether the kernel reports this link as a bridge device
pub(crate) fn is_bridge(link: &LinkMessage) -> bool {
    link.attributes.iter().any(|attr| match attr {
        LinkAttribute::LinkInfo(infos) => infos
            .iter()
            .any(|info| matches!(info, LinkInfo::Kind(InfoKind::Bridge))),
        _ => false,
    })
}
