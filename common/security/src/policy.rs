use common_auth::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    CustomerView,
    CustomerWrite,
    ProductView,
    ProductWrite,
    SaleView,
    SaleWrite,
    StatsView,
}

impl Capability {
    pub const ALL: [Capability; 7] = [
        Capability::CustomerView,
        Capability::CustomerWrite,
        Capability::ProductView,
        Capability::ProductWrite,
        Capability::SaleView,
        Capability::SaleWrite,
        Capability::StatsView,
    ];

    // Which roles are allowed each capability. Admins read everything but only
    // employees mutate records; analytics is admin only.
    pub fn allowed_roles(self) -> &'static [Role] {
        use Capability::*;
        match self {
            CustomerView | ProductView | SaleView => &[Role::Employee, Role::Admin],
            CustomerWrite | ProductWrite | SaleWrite => &[Role::Employee],
            StatsView => &[Role::Admin],
        }
    }

    pub fn permits(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::CustomerView => "customer_view",
            Capability::CustomerWrite => "customer_write",
            Capability::ProductView => "product_view",
            Capability::ProductWrite => "product_write",
            Capability::SaleView => "sale_view",
            Capability::SaleWrite => "sale_write",
            Capability::StatsView => "stats_view",
        }
    }
}

/// Type-level capability so a route's role set is fixed by its handler signature.
pub trait Gate: Send + Sync + 'static {
    const CAPABILITY: Capability;
}

macro_rules! gates {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl super::Gate for $name {
                const CAPABILITY: super::Capability = super::Capability::$name;
            }
        )*
    };
}

/// Marker types for [`crate::Authorized`], one per capability.
pub mod gate {
    gates!(
        CustomerView,
        CustomerWrite,
        ProductView,
        ProductWrite,
        SaleView,
        SaleWrite,
        StatsView,
    );
}
