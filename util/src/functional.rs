/// Apply `f` to `v` and hand `v` back, for building values in expression position
///
/// ```rust
/// # use guestcrypt_util::functional::mutating;
/// let v = mutating(vec![3, 1, 2], |v| v.sort());
/// assert_eq!(v, vec![1, 2, 3]);
/// ```
pub fn mutating<T, F>(mut v: T, f: F) -> T
where
    F: Fn(&mut T),
{
    f(&mut v);
    v
}
