/// Recommended error type for code built on top of the runner, such as a custom `main` function.
/// It is compatible with every fallible function exported by the runner so you can use `?` to
/// propagate errors.
pub type TimeItResult<T> = anyhow::Result<T>;
