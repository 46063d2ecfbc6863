//! Product streams published in the NOAA GOES-16 bucket.

use crate::error::{CatalogError, CatalogResult};

/// Top-level product prefixes of the `noaa-goes16` bucket.
pub const GOES_PRODUCTS: &[&str] = &[
    "ABI-L1b-RadC",
    "ABI-L1b-RadF",
    "ABI-L1b-RadM",
    "ABI-L2-ACHAC",
    "ABI-L2-ACHAF",
    "ABI-L2-ACHAM",
    "ABI-L2-ACHTF",
    "ABI-L2-ACHTM",
    "ABI-L2-ACMC",
    "ABI-L2-ACMF",
    "ABI-L2-ACMM",
    "ABI-L2-ACTPC",
    "ABI-L2-ACTPF",
    "ABI-L2-ACTPM",
    "ABI-L2-ADPC",
    "ABI-L2-ADPF",
    "ABI-L2-ADPM",
    "ABI-L2-AODC",
    "ABI-L2-AODF",
    "ABI-L2-CMIPC",
    "ABI-L2-CMIPF",
    "ABI-L2-CMIPM",
    "ABI-L2-CODC",
    "ABI-L2-CODF",
    "ABI-L2-CPSC",
    "ABI-L2-CPSF",
    "ABI-L2-CPSM",
    "ABI-L2-CTPC",
    "ABI-L2-CTPF",
    "ABI-L2-DMWC",
    "ABI-L2-DMWF",
    "ABI-L2-DMWM",
    "ABI-L2-DSIC",
    "ABI-L2-DSIF",
    "ABI-L2-DSIM",
    "ABI-L2-DSRC",
    "ABI-L2-DSRF",
    "ABI-L2-DSRM",
    "ABI-L2-FDCC",
    "ABI-L2-FDCF",
    "ABI-L2-LSTC",
    "ABI-L2-LSTF",
    "ABI-L2-LSTM",
    "ABI-L2-LVMPC",
    "ABI-L2-LVMPF",
    "ABI-L2-LVMPM",
    "ABI-L2-LVTPC",
    "ABI-L2-LVTPF",
    "ABI-L2-LVTPM",
    "ABI-L2-MCMIPC",
    "ABI-L2-MCMIPF",
    "ABI-L2-MCMIPM",
    "ABI-L2-RRQPEF",
    "ABI-L2-RSRC",
    "ABI-L2-RSRF",
    "ABI-L2-SSTF",
    "ABI-L2-TPWC",
    "ABI-L2-TPWF",
    "ABI-L2-TPWM",
    "ABI-L2-VAAF",
    "GLM-L2-LCFA",
    "SUVI-L1b-Fe093",
    "SUVI-L1b-Fe13",
    "SUVI-L1b-Fe131",
    "SUVI-L1b-Fe17",
    "SUVI-L1b-Fe171",
    "SUVI-L1b-Fe195",
    "SUVI-L1b-Fe284",
    "SUVI-L1b-He303",
];

/// Check a product name against the bucket's top-level prefixes.
/// A trailing `/` is ignored.
pub fn is_known_product(product: &str) -> bool {
    GOES_PRODUCTS.contains(&product.trim_end_matches('/'))
}

/// Like [`is_known_product`] but returns the normalized name or an error.
pub fn validate_product(product: &str) -> CatalogResult<&str> {
    let name = product.trim_end_matches('/');
    if is_known_product(name) {
        Ok(name)
    } else {
        Err(CatalogError::UnknownProduct(product.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_products() {
        assert!(is_known_product("ABI-L2-CMIPF"));
        assert!(is_known_product("ABI-L2-CMIPF/"));
        assert!(!is_known_product("ABI-L2-CMIP"));
        assert_eq!(validate_product("ABI-L2-ACMF/").unwrap(), "ABI-L2-ACMF");
        assert!(matches!(
            validate_product("HRRR"),
            Err(CatalogError::UnknownProduct(_))
        ));
    }
}
