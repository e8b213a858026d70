use darling::ast::{Data, Style};
use darling::util::Ignored;
use darling::{Error, FromDeriveInput, FromField, Result};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Generics, Ident, Type};

#[derive(FromDeriveInput)]
#[darling(attributes(injectable), supports(struct_any))]
struct InjectableInput {
    ident: Ident,
    generics: Generics,
    data: Data<Ignored, InjectField>,
    #[darling(default)]
    token: Option<String>,
    #[darling(default)]
    singleton: bool,
    #[darling(default)]
    scoped: bool,
    #[darling(default)]
    register: bool,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    #[darling(default)]
    token: Option<String>,
}

impl InjectField {
    fn dependency_token(&self) -> TokenStream {
        match &self.token {
            Some(name) => quote!(::wirebox::Token::named(#name)),
            None => {
                let ty = &self.ty;
                quote!(<#ty as ::wirebox::FromInstance>::default_token())
            }
        }
    }
}

pub fn expand(input: &DeriveInput) -> Result<TokenStream> {
    let input = InjectableInput::from_derive_input(input)?;
    let ident = &input.ident;

    if input.singleton && input.scoped {
        return Err(Error::custom("`singleton` and `scoped` cannot both be set").with_span(ident));
    }

    if input.register && !input.generics.params.is_empty() {
        return Err(
            Error::custom("`register` is not supported on generic types").with_span(&input.generics),
        );
    }

    let fields = input
        .data
        .take_struct()
        .ok_or_else(|| Error::custom("Injectable can only be derived for structs").with_span(ident))?;

    let dependencies: Vec<TokenStream> = fields.fields.iter().map(InjectField::dependency_token).collect();

    let construction = match fields.style {
        Style::Struct => {
            let names = fields.fields.iter().filter_map(|field| field.ident.as_ref());
            quote!(Self { #(#names: args.take()?),* })
        }
        Style::Tuple => {
            let takes = fields.fields.iter().map(|_| quote!(args.take()?));
            quote!(Self(#(#takes),*))
        }
        Style::Unit => quote!(Self),
    };

    let lifetime = if input.singleton {
        quote!(::wirebox::Lifetime::Singleton)
    } else if input.scoped {
        quote!(::wirebox::Lifetime::Scoped)
    } else {
        quote!(::wirebox::Lifetime::Transient)
    };

    let token_fn = input.token.as_ref().map(|name| {
        quote! {
            fn token() -> ::wirebox::Token {
                ::wirebox::Token::named(#name)
            }
        }
    });

    let args_binding = if fields.fields.is_empty() {
        quote!(_args)
    } else {
        quote!(args)
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let discovery = input.register.then(|| {
        quote! {
            const _: () = {
                fn register(
                    container: &::wirebox::Container,
                ) -> ::wirebox::Result<::wirebox::RegistrationId> {
                    container.register_injectable::<#ident>()
                }

                ::wirebox::internal::submit! {
                    ::wirebox::internal::Discovered {
                        name: ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident)),
                        register,
                    }
                }
            };
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::wirebox::Injectable for #ident #ty_generics #where_clause {
            #token_fn

            fn lifetime() -> ::wirebox::Lifetime {
                #lifetime
            }

            fn dependencies() -> ::std::vec::Vec<::wirebox::Token> {
                ::std::vec![#(#dependencies),*]
            }

            fn construct(#args_binding: &mut ::wirebox::Arguments) -> ::wirebox::Result<Self> {
                ::std::result::Result::Ok(#construction)
            }
        }

        #discovery
    })
}
