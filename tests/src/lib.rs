//! End-to-end runs of the enumeration engine against scripted tools.

#[cfg(test)]
mod pipeline {
    mod integration;
}
