//! Vendor, bank account and shipping tariff operations.

use super::{Shop, bump};
use crate::error::ShopError;
use crate::money::Money;
use crate::primitives::{clean_name, clean_text, fold};
use crate::types::{BankAccountId, TariffId, Timestamp, VendorId};
use crate::vendor::{
    BankAccount, BankAccountInput, ShippingTariff, TariffInput, Vendor, VendorInput,
    VendorUpdate, normalize_account_number, normalize_region, select_tariff, validate_email,
};

impl Shop {
    // =========================================================================
    // VENDORS
    // =========================================================================

    /// Register a new, active vendor.
    pub fn create_vendor(
        &mut self,
        input: &VendorInput,
        now: Timestamp,
    ) -> Result<VendorId, ShopError> {
        let name = clean_name("name", &input.name)?;
        let email = validate_email(&input.email)?;
        self.ensure_vendor_name_free(&name, None)?;

        let id = VendorId(bump(&mut self.counters.vendor)?);
        self.vendors.insert(
            id,
            Vendor {
                id,
                name,
                email,
                active: true,
                created_at: now,
            },
        );
        Ok(id)
    }

    /// Change a vendor's name and/or email.
    pub fn update_vendor(&mut self, id: VendorId, update: &VendorUpdate) -> Result<(), ShopError> {
        self.vendor(id)?;
        let name = match &update.name {
            Some(raw) => {
                let name = clean_name("name", raw)?;
                self.ensure_vendor_name_free(&name, Some(id))?;
                Some(name)
            }
            None => None,
        };
        let email = update.email.as_deref().map(validate_email).transpose()?;

        let vendor = self.vendor_mut(id)?;
        if let Some(name) = name {
            vendor.name = name;
        }
        if let Some(email) = email {
            vendor.email = email;
        }
        Ok(())
    }

    /// Activate or deactivate a vendor. Inactive vendors cannot sell.
    pub fn set_vendor_active(&mut self, id: VendorId, active: bool) -> Result<(), ShopError> {
        self.vendor_mut(id)?.active = active;
        Ok(())
    }

    fn ensure_vendor_name_free(&self, name: &str, except: Option<VendorId>) -> Result<(), ShopError> {
        let key = fold(name);
        let taken = self
            .vendors
            .values()
            .any(|v| Some(v.id) != except && fold(&v.name) == key);
        if taken {
            return Err(ShopError::conflict(format!("vendor '{name}' already exists")));
        }
        Ok(())
    }

    // =========================================================================
    // BANK ACCOUNTS
    // =========================================================================

    /// Bank accounts of a vendor, in id order.
    pub fn bank_accounts_of(&self, vendor: VendorId) -> impl Iterator<Item = &BankAccount> {
        self.bank_accounts
            .values()
            .filter(move |a| a.vendor_id == vendor)
    }

    /// The vendor's primary account, if it has any account at all.
    #[must_use]
    pub fn primary_account_of(&self, vendor: VendorId) -> Option<&BankAccount> {
        self.bank_accounts_of(vendor).find(|a| a.primary)
    }

    /// Add an account. The vendor's first account becomes primary.
    pub fn add_bank_account(
        &mut self,
        vendor: VendorId,
        input: &BankAccountInput,
    ) -> Result<BankAccountId, ShopError> {
        self.vendor(vendor)?;
        let bank_name = clean_name("bank_name", &input.bank_name)?;
        let holder_name = clean_name("holder_name", &input.holder_name)?;
        let account_number = normalize_account_number(&input.account_number)?;

        if self
            .bank_accounts_of(vendor)
            .any(|a| a.account_number == account_number)
        {
            return Err(ShopError::conflict(
                "account number already registered for this vendor",
            ));
        }
        let primary = self.primary_account_of(vendor).is_none();

        let id = BankAccountId(bump(&mut self.counters.bank_account)?);
        self.bank_accounts.insert(
            id,
            BankAccount {
                id,
                vendor_id: vendor,
                bank_name,
                holder_name,
                account_number,
                primary,
            },
        );
        Ok(id)
    }

    /// Make `account` the vendor's only primary account.
    pub fn set_primary_account(&mut self, account: BankAccountId) -> Result<(), ShopError> {
        let vendor = self
            .bank_accounts
            .get(&account)
            .ok_or_else(|| ShopError::not_found("bank account", account))?
            .vendor_id;

        for a in self.bank_accounts.values_mut() {
            if a.vendor_id == vendor {
                a.primary = a.id == account;
            }
        }
        Ok(())
    }

    /// Remove an account. Removing the primary promotes the lowest remaining id.
    pub fn remove_bank_account(&mut self, account: BankAccountId) -> Result<(), ShopError> {
        let removed = self
            .bank_accounts
            .remove(&account)
            .ok_or_else(|| ShopError::not_found("bank account", account))?;

        if removed.primary {
            if let Some(next) = self
                .bank_accounts
                .values_mut()
                .find(|a| a.vendor_id == removed.vendor_id)
            {
                next.primary = true;
            }
        }
        Ok(())
    }

    // =========================================================================
    // SHIPPING TARIFFS
    // =========================================================================

    /// Tariffs of a vendor, in id order.
    pub fn tariffs_of(&self, vendor: VendorId) -> impl Iterator<Item = &ShippingTariff> {
        self.tariffs.values().filter(move |t| t.vendor_id == vendor)
    }

    /// Create the tariff for a region, or replace it if one exists.
    pub fn set_shipping_tariff(
        &mut self,
        vendor: VendorId,
        input: &TariffInput,
    ) -> Result<TariffId, ShopError> {
        self.vendor(vendor)?;
        let region = if input.region.trim() == crate::primitives::FALLBACK_REGION {
            crate::primitives::FALLBACK_REGION.to_string()
        } else {
            normalize_region(&input.region)?
        };

        let existing = self
            .tariffs_of(vendor)
            .find(|t| t.region == region)
            .map(|t| t.id);
        let id = match existing {
            Some(id) => id,
            None => TariffId(bump(&mut self.counters.tariff)?),
        };

        self.tariffs.insert(
            id,
            ShippingTariff {
                id,
                vendor_id: vendor,
                region,
                base_cost: input.base_cost,
                per_item_cost: input.per_item_cost,
                free_over: input.free_over,
            },
        );
        Ok(id)
    }

    pub fn remove_tariff(&mut self, tariff: TariffId) -> Result<(), ShopError> {
        self.tariffs
            .remove(&tariff)
            .map(|_| ())
            .ok_or_else(|| ShopError::not_found("tariff", tariff))
    }

    /// Shipping cost for `item_count` items worth `subtotal` sent to `region`.
    pub fn shipping_quote(
        &self,
        vendor: VendorId,
        region: &str,
        item_count: u64,
        subtotal: Money,
    ) -> Result<Money, ShopError> {
        self.vendor(vendor)?;
        let region = clean_text("region", region, 64)?;
        let tariff = select_tariff(self.tariffs_of(vendor), &region).ok_or_else(|| {
            ShopError::NoShippingTariff {
                vendor: vendor.0,
                region: region.to_uppercase(),
            }
        })?;
        tariff.cost(item_count, subtotal)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::error::ShopError;
    use crate::money::Money;
    use crate::shop::Shop;
    use crate::shop::test_support::*;
    use crate::types::VendorId;
    use crate::vendor::{BankAccountInput, TariffInput, VendorInput, VendorUpdate};

    fn account(number: &str) -> BankAccountInput {
        BankAccountInput {
            bank_name: "Banco".into(),
            holder_name: "Holder".into(),
            account_number: number.into(),
        }
    }

    #[test]
    fn vendor_names_are_unique_case_insensitively() {
        let mut shop = Shop::new();
        let input = VendorInput {
            name: "Acme".into(),
            email: "a@acme.com".into(),
        };
        shop.create_vendor(&input, NOW).unwrap();
        let dup = VendorInput {
            name: " ACME ".into(),
            email: "b@acme.com".into(),
        };
        assert!(matches!(
            shop.create_vendor(&dup, NOW),
            Err(ShopError::Conflict(_))
        ));
    }

    #[test]
    fn update_vendor_keeps_own_name() {
        let mut fx = fixture().unwrap();
        let update = VendorUpdate {
            name: Some("acme".into()),
            email: Some("new@acme.com".into()),
        };
        fx.shop.update_vendor(fx.vendor, &update).unwrap();
        assert_eq!(fx.shop.vendor(fx.vendor).unwrap().email, "new@acme.com");
    }

    #[test]
    fn update_vendor_applies_only_given_fields() {
        let mut fx = fixture().unwrap();
        let before = fx.shop.vendor(fx.vendor).unwrap().name.clone();

        let email_only = VendorUpdate {
            name: None,
            email: Some("Ventas@Acme.com".into()),
        };
        fx.shop.update_vendor(fx.vendor, &email_only).unwrap();
        let vendor = fx.shop.vendor(fx.vendor).unwrap();
        assert_eq!(vendor.name, before);
        assert_eq!(vendor.email, "ventas@acme.com");

        let name_only = VendorUpdate {
            name: Some("Acme Norte".into()),
            email: None,
        };
        fx.shop.update_vendor(fx.vendor, &name_only).unwrap();
        let vendor = fx.shop.vendor(fx.vendor).unwrap();
        assert_eq!(vendor.name, "Acme Norte");
        assert_eq!(vendor.email, "ventas@acme.com");

        let blank = VendorUpdate {
            name: Some("  ".into()),
            email: Some("other@acme.com".into()),
        };
        assert!(fx.shop.update_vendor(fx.vendor, &blank).is_err());
        assert_eq!(fx.shop.vendor(fx.vendor).unwrap().email, "ventas@acme.com");
    }

    #[test]
    fn first_account_is_primary_and_exactly_one_stays_primary() {
        let mut fx = fixture().unwrap();
        let first = fx.shop.primary_account_of(fx.vendor).unwrap().id;
        let second = fx
            .shop
            .add_bank_account(fx.vendor, &account("DE89370400440532013000"))
            .unwrap();
        assert_eq!(fx.shop.primary_account_of(fx.vendor).unwrap().id, first);

        fx.shop.set_primary_account(second).unwrap();
        let primaries = fx
            .shop
            .bank_accounts_of(fx.vendor)
            .filter(|a| a.primary)
            .count();
        assert_eq!(primaries, 1);
        assert_eq!(fx.shop.primary_account_of(fx.vendor).unwrap().id, second);
    }

    #[test]
    fn removing_primary_promotes_lowest_remaining() {
        let mut fx = fixture().unwrap();
        let first = fx.shop.primary_account_of(fx.vendor).unwrap().id;
        let second = fx
            .shop
            .add_bank_account(fx.vendor, &account("DE89370400440532013000"))
            .unwrap();
        let third = fx
            .shop
            .add_bank_account(fx.vendor, &account("FR1420041010050500013M02606"))
            .unwrap();
        fx.shop.set_primary_account(third).unwrap();

        fx.shop.remove_bank_account(third).unwrap();
        assert_eq!(fx.shop.primary_account_of(fx.vendor).unwrap().id, first);
        fx.shop.remove_bank_account(first).unwrap();
        assert_eq!(fx.shop.primary_account_of(fx.vendor).unwrap().id, second);
        fx.shop.remove_bank_account(second).unwrap();
        assert!(fx.shop.primary_account_of(fx.vendor).is_none());
    }

    #[test]
    fn duplicate_account_number_conflicts() {
        let mut fx = fixture().unwrap();
        let result = fx
            .shop
            .add_bank_account(fx.vendor, &account("es91 2100 0418 4502 0005 1332"));
        assert!(matches!(result, Err(ShopError::Conflict(_))));
    }

    #[test]
    fn tariff_upsert_replaces_by_region() {
        let mut fx = fixture().unwrap();
        let input = TariffInput {
            region: "madrid".into(),
            base_cost: Money::from_cents(300),
            per_item_cost: Money::ZERO,
            free_over: None,
        };
        let first = fx.shop.set_shipping_tariff(fx.vendor, &input).unwrap();
        let second = fx
            .shop
            .set_shipping_tariff(
                fx.vendor,
                &TariffInput {
                    base_cost: Money::from_cents(250),
                    ..input
                },
            )
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(fx.shop.tariffs_of(fx.vendor).count(), 2);

        let quote = fx
            .shop
            .shipping_quote(fx.vendor, "MADRID", 4, Money::ZERO)
            .unwrap();
        assert_eq!(quote, Money::from_cents(250));
    }

    #[test]
    fn quote_uses_fallback_then_fails_without_it() {
        let mut fx = fixture().unwrap();
        let quote = fx
            .shop
            .shipping_quote(fx.vendor, "Sevilla", 2, Money::ZERO)
            .unwrap();
        assert_eq!(quote, Money::from_cents(700));

        let fallback = fx.shop.tariffs_of(fx.vendor).next().unwrap().id;
        fx.shop.remove_tariff(fallback).unwrap();
        assert!(matches!(
            fx.shop.shipping_quote(fx.vendor, "Sevilla", 2, Money::ZERO),
            Err(ShopError::NoShippingTariff { .. })
        ));
    }

    #[test]
    fn operations_on_unknown_vendor_fail() {
        let mut shop = Shop::new();
        assert!(matches!(
            shop.set_vendor_active(VendorId(9), false),
            Err(ShopError::NotFound { .. })
        ));
        assert!(shop.add_bank_account(VendorId(9), &account("12345678")).is_err());
    }
}
