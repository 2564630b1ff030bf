use crate::{Error, SweepSettings};

fn check_axis(name: &str, values: &[usize]) -> Result<(), Error> {
    if values.is_empty() {
        return Err(Error::InvalidConfig(format!("{} list is empty", name)));
    }
    if values.iter().any(|&v| v == 0) {
        return Err(Error::InvalidConfig(format!("{} must be positive", name)));
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    if sorted.windows(2).any(|w| w[0] == w[1]) {
        return Err(Error::InvalidConfig(format!("{} list has duplicates", name)));
    }
    Ok(())
}

pub fn validate(settings: &SweepSettings) -> Result<(), Error> {
    check_axis("thread count", &settings.thread_counts)?;
    check_axis("chunk size", &settings.chunk_sizes)?;

    if settings.integrands.is_empty() {
        return Err(Error::InvalidConfig("integrand list is empty".into()));
    }
    let mut integrands = settings.integrands.clone();
    integrands.sort();
    integrands.dedup();
    if integrands.len() != settings.integrands.len() {
        return Err(Error::InvalidConfig("integrand list has duplicates".into()));
    }

    if settings.schedule_kinds.is_empty() {
        return Err(Error::InvalidConfig("schedule kind list is empty".into()));
    }
    let mut kinds = settings.schedule_kinds.clone();
    kinds.sort();
    kinds.dedup();
    if kinds.len() != settings.schedule_kinds.len() {
        return Err(Error::InvalidConfig("schedule kind list has duplicates".into()));
    }

    if settings.point_count == 0 {
        return Err(Error::InvalidConfig("point count must be positive".into()));
    }
    if settings.repeat == 0 {
        return Err(Error::InvalidConfig("repeat count must be at least 1".into()));
    }
    if settings.timeout_ms == Some(0) {
        return Err(Error::InvalidConfig("timeout must be positive".into()));
    }
    if settings.env.threads.is_empty() || settings.env.schedule.is_empty() {
        return Err(Error::InvalidConfig("environment variable names must be set".into()));
    }

    Ok(())
}
