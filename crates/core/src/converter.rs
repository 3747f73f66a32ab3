/// Maps between the network, local (persisted) and output representations.
pub trait Converter<N, L, O>: Send + Sync {
    fn network_to_output(&self, network: &N) -> O;

    fn output_to_local(&self, output: &O) -> L;

    fn network_to_local(&self, network: &N) -> L;
}

/// Converter for stores where all three representations are the same type.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityConverter;

impl<T: Clone> Converter<T, T, T> for IdentityConverter {
    fn network_to_output(&self, network: &T) -> T {
        network.clone()
    }

    fn output_to_local(&self, output: &T) -> T {
        output.clone()
    }

    fn network_to_local(&self, network: &T) -> T {
        network.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_converter() {
        let converter = IdentityConverter;
        let value = "campaign".to_string();
        assert_eq!(converter.network_to_output(&value), value);
        assert_eq!(converter.network_to_local(&value), value);
        assert_eq!(converter.output_to_local(&value), value);
    }
}
