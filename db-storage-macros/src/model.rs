use convert_case::{Case, Casing};
use darling::{FromDeriveInput, FromField, ast::Data};
use proc_macro_error2::{abort, emit_error};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, Type, parse2};

#[derive(FromField, Debug, Clone)]
#[darling(attributes(entity))]
struct EntityField {
    ident: Option<Ident>,
    ty: Type,
    column: Option<String>,
    backref: Option<String>,
    #[darling(default)]
    identity: bool,
    #[darling(default)]
    unique: bool,
    #[darling(default)]
    lazy: bool,
    #[darling(default)]
    cascade: bool,
    #[darling(default)]
    skip: bool,
}

#[derive(FromDeriveInput)]
#[darling(attributes(entity))]
struct EntityTarget {
    ident: Ident,
    table: Option<String>,
    data: Data<(), EntityField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Column,
    ToOne,
    ToMany,
    Lazy,
}

impl FieldKind {
    fn of(ty: &Type) -> Self {
        let Type::Path(path) = ty else {
            return Self::Column;
        };

        match path.path.segments.last().map(|e| e.ident.to_string()).as_deref() {
            Some("Related") => Self::ToOne,
            Some("RelatedMany") => Self::ToMany,
            Some("Lazy") => Self::Lazy,
            _ => Self::Column,
        }
    }
}

pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match parse2(input) {
        Ok(r) => r,
        Err(e) => return e.to_compile_error(),
    };

    let target = match EntityTarget::from_derive_input(&input) {
        Ok(r) => r,
        Err(e) => return e.write_errors(),
    };

    let Some(struct_data) = target.data.take_struct() else {
        abort! {
            input, "Target is not a struct.";
            note = "This macro must be run on a struct.";
        };
    };

    let fields = struct_data
        .fields
        .into_iter()
        .filter(|e| !e.skip)
        .map(|e| {
            let Some(ident) = e.ident.clone() else {
                abort! {
                    input, "Field has no ident.";
                    note = "This macro cannot be run on tuple structs.";
                };
            };
            (ident, e)
        })
        .collect::<Vec<_>>();

    let marked = fields.iter().filter(|(_, e)| e.identity).count();
    let identity = match marked {
        0 => fields.iter().find(|(ident, _)| ident == "id"),
        1 => fields.iter().find(|(_, e)| e.identity),
        _ => {
            fields.iter().filter(|(_, e)| e.identity).for_each(|(ident, _)| {
                emit_error! {
                    ident.span(), "Clashing identity \"{}\" here.", ident
                };
            });
            abort! {
                input, "More than one identity.";
                note = "Mark exactly one field with #[entity(identity)].";
            }
        }
    };

    let Some((identity_ident, identity_field)) = identity else {
        abort! {
            input, "Missing identity.";
            note = "Name a field `id`, or mark the identity with #[entity(identity)]. It must be an `Option<i64>`.";
        }
    };

    let model_ident = &target.ident;
    let owner_name = model_ident.to_string().to_case(Case::Snake);
    let table_name = target.table.clone().unwrap_or_else(|| owner_name.clone());

    let identity_decl = {
        let name = identity_ident.to_string();
        let column = identity_field.column.clone().unwrap_or_else(|| name.clone());

        quote! {
            .identity(#name, #column, |e| &e.#identity_ident, |e| &mut e.#identity_ident)
        }
    };

    let attribute_decls = fields
        .iter()
        .filter(|(ident, _)| ident != identity_ident)
        .map(|(ident, e)| {
            let name = ident.to_string();
            let options = {
                let lazy = e.lazy;
                let cascade = e.cascade;

                quote! {
                    ::db_storage::RelationOptions {
                        lazy: #lazy,
                        cascading_delete: #cascade,
                    }
                }
            };

            match FieldKind::of(&e.ty) {
                FieldKind::Column => {
                    let column = e.column.clone().unwrap_or_else(|| name.clone());
                    let method = if e.unique {
                        quote!(unique_column)
                    } else {
                        quote!(column)
                    };

                    quote! {
                        .#method(#name, #column, |e| &e.#ident, |e| &mut e.#ident)
                    }
                }
                FieldKind::Lazy => {
                    let column = e.column.clone().unwrap_or_else(|| name.clone());

                    quote! {
                        .lazy(#name, #column, |e| &e.#ident, |e| &mut e.#ident)
                    }
                }
                FieldKind::ToOne => {
                    let column = e.column.clone().unwrap_or_else(|| format!("{name}_id"));

                    quote! {
                        .to_one(#name, #column, #options, |e| &e.#ident, |e| &mut e.#ident)
                    }
                }
                FieldKind::ToMany => {
                    if e.column.is_some() {
                        emit_error! {
                            ident.span(), "A to-many relation has no column of its own.";
                            note = "Use #[entity(backref = \"name\")] to name the `<name>_id` column in the target table.";
                        };
                    }

                    let backref = e.backref.clone().unwrap_or_else(|| owner_name.clone());

                    quote! {
                        .to_many(#name, #backref, #options, |e| &e.#ident, |e| &mut e.#ident)
                    }
                }
            }
        })
        .collect::<Vec<_>>();

    quote! {
        impl ::db_storage::Entity for #model_ident {
            const TABLE: &'static str = #table_name;

            fn declare(declaration: &mut ::db_storage::Declaration<Self>) {
                declaration
                    #identity_decl
                    #(
                        #attribute_decls
                    )*;
            }
        }
    }
}
