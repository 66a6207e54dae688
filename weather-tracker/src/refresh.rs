/// Decide whether a request needs the network.
///
/// Fetches when the caller forces a reload or when the cache had nothing
/// usable to offer.
pub fn should_fetch<T>(force_reload: bool, cache_lookup: Option<&T>) -> bool {
    force_reload || cache_lookup.is_none()
}
