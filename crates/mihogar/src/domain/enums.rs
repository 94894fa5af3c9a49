use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Backend enums arrive as free-form strings. Parsing is total: an unknown or
/// malformed value logs a warning and collapses to the enum's documented
/// fallback instead of failing the whole payload.
pub trait FallbackEnum: Sized + Copy + 'static {
    const FALLBACK: Self;

    /// Wire name / variant pairs, SCREAMING_SNAKE_CASE as the backend sends them.
    fn variants() -> &'static [(&'static str, Self)];

    fn as_str(self) -> &'static str;
}

/// Total parse: trims, uppercases, and matches against the wire names.
/// Never fails; mismatches are logged and mapped to the fallback.
pub fn parse_or_fallback<T: FallbackEnum>(raw: &str) -> T {
    let normalized = raw.trim().to_ascii_uppercase();
    for (name, value) in T::variants() {
        if *name == normalized {
            return *value;
        }
    }
    warn!(
        raw,
        fallback = T::FALLBACK.as_str(),
        kind = std::any::type_name::<T>(),
        "unrecognized enum value, using fallback"
    );
    T::FALLBACK
}

fn deserialize_fallback<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FallbackEnum,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_or_fallback(&raw))
}

macro_rules! fallback_enum {
    (
        $(#[$meta:meta])*
        $name:ident, fallback = $fallback:ident, {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $($variant,)+
        }

        impl FallbackEnum for $name {
            const FALLBACK: Self = Self::$fallback;

            fn variants() -> &'static [(&'static str, Self)] {
                &[$(($wire, Self::$variant),)+]
            }

            fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserialize_fallback(deserializer)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

fallback_enum!(
    /// Loan currency. Every computed total in the simulation flow is PEN.
    Currency, fallback = Pen, {
        Pen => "PEN",
        Usd => "USD",
    }
);

fallback_enum!(
    RateType, fallback = Effective, {
        Nominal => "NOMINAL",
        Effective => "EFFECTIVE",
    }
);

fallback_enum!(
    /// Only meaningful for nominal rates.
    CapitalizationPeriod, fallback = Monthly, {
        Daily => "DAILY",
        Biweekly => "BIWEEKLY",
        Monthly => "MONTHLY",
        Bimonthly => "BIMONTHLY",
        Quarterly => "QUARTERLY",
        Semiannual => "SEMIANNUAL",
        Annual => "ANNUAL",
    }
);

fallback_enum!(
    /// TOTAL defers all payments (interest capitalizes); PARTIAL pays interest only.
    GraceType, fallback = Total, {
        Partial => "PARTIAL",
        Total => "TOTAL",
    }
);

fallback_enum!(
    SimulationStatus, fallback = Draft, {
        Draft => "DRAFT",
        Saved => "SAVED",
        ConvertedToApplication => "CONVERTED_TO_APPLICATION",
        Expired => "EXPIRED",
    }
);

fallback_enum!(
    /// Government subsidies ("bonos") applied toward the down payment.
    SubsidyType, fallback = BonoBuenPagador, {
        BonoBuenPagador => "BONO_BUEN_PAGADOR",
        BfhCompra => "BFH_COMPRA",
        BfhConstruccion => "BFH_CONSTRUCCION",
        BfhMejora => "BFH_MEJORA",
        BonoIntegrador => "BONO_INTEGRADOR",
        BonoVerde => "BONO_VERDE",
    }
);

fallback_enum!(
    LoanProgramKind, fallback = NuevoCreditoMivivienda, {
        NuevoCreditoMivivienda => "NUEVO_CREDITO_MIVIVIENDA",
        TechoPropio => "TECHO_PROPIO",
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exact_wire_names() {
        assert_eq!(parse_or_fallback::<Currency>("PEN"), Currency::Pen);
        assert_eq!(parse_or_fallback::<Currency>("USD"), Currency::Usd);
        assert_eq!(
            parse_or_fallback::<SubsidyType>("BONO_VERDE"),
            SubsidyType::BonoVerde
        );
        assert_eq!(
            parse_or_fallback::<SimulationStatus>("CONVERTED_TO_APPLICATION"),
            SimulationStatus::ConvertedToApplication
        );
    }

    #[test]
    fn parsing_normalizes_case_and_whitespace() {
        assert_eq!(parse_or_fallback::<RateType>("  nominal "), RateType::Nominal);
        assert_eq!(parse_or_fallback::<GraceType>("partial"), GraceType::Partial);
    }

    #[test]
    fn parsing_is_total_over_arbitrary_strings() {
        // Exhaustively messy inputs must all land on the fallback, never panic.
        let garbage = [
            "",
            " ",
            "\n\t",
            "pen-ish",
            "SOLES",
            "0",
            "null",
            "undefined",
            "ñ€漢字",
            "PEN USD",
            "EFFECTIVE_RATE",
            "\u{0}\u{1}\u{2}",
            "a-very-long-string-that-matches-nothing-at-all-in-any-enum-table",
        ];
        for raw in garbage {
            assert_eq!(parse_or_fallback::<Currency>(raw), Currency::Pen);
            assert_eq!(parse_or_fallback::<RateType>(raw), RateType::Effective);
            assert_eq!(
                parse_or_fallback::<CapitalizationPeriod>(raw),
                CapitalizationPeriod::Monthly
            );
            assert_eq!(parse_or_fallback::<GraceType>(raw), GraceType::Total);
            assert_eq!(
                parse_or_fallback::<SimulationStatus>(raw),
                SimulationStatus::Draft
            );
            assert_eq!(
                parse_or_fallback::<SubsidyType>(raw),
                SubsidyType::BonoBuenPagador
            );
            assert_eq!(
                parse_or_fallback::<LoanProgramKind>(raw),
                LoanProgramKind::NuevoCreditoMivivienda
            );
        }
    }

    #[test]
    fn serde_round_trips_wire_names() {
        let json = serde_json::to_string(&SubsidyType::BfhConstruccion).expect("serializes");
        assert_eq!(json, "\"BFH_CONSTRUCCION\"");
        let back: SubsidyType = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, SubsidyType::BfhConstruccion);
    }

    #[test]
    fn deserializing_unknown_string_uses_fallback() {
        let status: SimulationStatus =
            serde_json::from_str("\"SOMETHING_NEW\"").expect("total parse never errors");
        assert_eq!(status, SimulationStatus::Draft);
    }
}
