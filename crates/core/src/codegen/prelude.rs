//! Hand-written declarations emitted verbatim: the shared types prelude and
//! the client runtime.

/// Names declared by [`TYPES_PRELUDE`], importable from the client module.
pub const PRELUDE_TYPE_NAMES: &[&str] = &[
    "JsonValue",
    "BlocksContent",
    "MediaFormat",
    "MediaFile",
    "StringFilter",
    "NumberFilter",
    "BooleanFilter",
    "DateFilter",
    "IdFilter",
    "PaginationParams",
    "SortParam",
    "PaginationMeta",
    "ResponseMeta",
    "ListResponse",
    "SingleResponse",
    "QueryParams",
    "SelectFields",
];

/// Shared declarations at the top of every types module.
pub const TYPES_PRELUDE: &str = r#"export type JsonValue =
  | string
  | number
  | boolean
  | null
  | JsonValue[]
  | { [key: string]: JsonValue };

export type BlocksContent = Array<{ type: string; children?: unknown[]; [key: string]: unknown }>;

export interface MediaFormat {
  name: string;
  url: string;
  width: number;
  height: number;
  size: number;
  mime: string;
  ext: string;
}

export interface MediaFile {
  id: number;
  documentId: string;
  name: string;
  alternativeText: string | null;
  caption: string | null;
  width: number | null;
  height: number | null;
  formats: Record<string, MediaFormat> | null;
  hash: string;
  ext: string;
  mime: string;
  size: number;
  url: string;
  previewUrl: string | null;
  provider: string;
  createdAt: string;
  updatedAt: string;
}

export interface StringFilter {
  $eq?: string;
  $eqi?: string;
  $ne?: string;
  $nei?: string;
  $in?: string[];
  $notIn?: string[];
  $contains?: string;
  $notContains?: string;
  $containsi?: string;
  $notContainsi?: string;
  $startsWith?: string;
  $startsWithi?: string;
  $endsWith?: string;
  $endsWithi?: string;
  $null?: boolean;
  $notNull?: boolean;
}

export interface NumberFilter {
  $eq?: number;
  $ne?: number;
  $lt?: number;
  $lte?: number;
  $gt?: number;
  $gte?: number;
  $in?: number[];
  $notIn?: number[];
  $between?: [number, number];
  $null?: boolean;
  $notNull?: boolean;
}

export interface BooleanFilter {
  $eq?: boolean;
  $ne?: boolean;
  $null?: boolean;
  $notNull?: boolean;
}

export interface DateFilter {
  $eq?: string;
  $ne?: string;
  $lt?: string;
  $lte?: string;
  $gt?: string;
  $gte?: string;
  $in?: string[];
  $notIn?: string[];
  $between?: [string, string];
  $null?: boolean;
  $notNull?: boolean;
}

export interface IdFilter {
  id?: NumberFilter | number;
  documentId?: StringFilter | string;
  $null?: boolean;
  $notNull?: boolean;
}

export interface PaginationParams {
  page?: number;
  pageSize?: number;
  start?: number;
  limit?: number;
  withCount?: boolean;
}

type SortKey<T> = Extract<keyof T, string>;

export type SortParam<T = Record<string, unknown>> =
  | SortKey<T>
  | `${SortKey<T>}:${"asc" | "desc"}`
  | Array<SortKey<T> | `${SortKey<T>}:${"asc" | "desc"}`>;

export interface PaginationMeta {
  page: number;
  pageSize: number;
  pageCount: number;
  total: number;
}

export interface ResponseMeta {
  pagination?: PaginationMeta;
}

export interface ListResponse<T> {
  data: T[];
  meta: ResponseMeta;
}

export interface SingleResponse<T> {
  data: T;
  meta: ResponseMeta;
}

export interface QueryParams<T, TFilters> {
  filters?: TFilters;
  fields?: (keyof T)[];
  sort?: SortParam<T>;
  pagination?: PaginationParams;
  status?: "draft" | "published";
  locale?: string;
}

/** Narrow `T` to the selected fields, always keeping identity fields. */
export type SelectFields<T, S> = S extends { fields: readonly (infer F)[] }
  ? Pick<T, Extract<F | "id" | "documentId", keyof T>>
  : T;
"#;

/// Client runtime. `{{API_PREFIX}}` is replaced with the configured prefix.
pub const CLIENT_RUNTIME: &str = r#"const DEFAULT_API_PREFIX = "{{API_PREFIX}}";

export interface ClientConfig {
  baseURL: string;
  token?: string;
  apiPrefix?: string;
  fetch?: typeof fetch;
  headers?: Record<string, string>;
}

export class ApiError extends Error {
  status: number;
  statusText: string;
  body: unknown;

  constructor(status: number, statusText: string, body: unknown) {
    super(`HTTP ${status}: ${statusText}`);
    this.name = "ApiError";
    this.status = status;
    this.statusText = statusText;
    this.body = body;
  }
}

function serializeQuery(value: unknown, prefix: string, out: string[]): string[] {
  if (value === undefined || value === null) {
    return out;
  }
  if (Array.isArray(value)) {
    value.forEach((item, index) => serializeQuery(item, `${prefix}[${index}]`, out));
  } else if (typeof value === "object") {
    for (const [key, inner] of Object.entries(value as Record<string, unknown>)) {
      serializeQuery(inner, prefix ? `${prefix}[${key}]` : key, out);
    }
  } else {
    out.push(`${encodeURIComponent(prefix)}=${encodeURIComponent(String(value))}`);
  }
  return out;
}

export function buildQuery(params?: object): string {
  if (!params) {
    return "";
  }
  const query = { ...(params as Record<string, unknown>) };
  if (query.populate === true) {
    query.populate = "*";
  }
  const parts = serializeQuery(query, "", []);
  return parts.length > 0 ? `?${parts.join("&")}` : "";
}

export abstract class BaseAPI {
  protected readonly config: ClientConfig;
  protected readonly endpoint: string;

  constructor(config: ClientConfig, endpoint: string) {
    this.config = config;
    this.endpoint = endpoint;
  }

  protected async request<T>(
    method: string,
    path: string,
    options: { query?: object; body?: unknown } = {},
  ): Promise<T> {
    const prefix = this.config.apiPrefix ?? DEFAULT_API_PREFIX;
    const url = `${this.config.baseURL.replace(/\/$/, "")}${prefix}${path}${buildQuery(options.query)}`;
    const headers: Record<string, string> = {
      "Content-Type": "application/json",
      ...this.config.headers,
    };
    if (this.config.token) {
      headers.Authorization = `Bearer ${this.config.token}`;
    }
    const fetchImpl = this.config.fetch ?? fetch;
    const response = await fetchImpl(url, {
      method,
      headers,
      body: options.body === undefined ? undefined : JSON.stringify(options.body),
    });
    const text = await response.text();
    const payload = text ? JSON.parse(text) : null;
    if (!response.ok) {
      throw new ApiError(response.status, response.statusText, payload);
    }
    return payload as T;
  }
}
"#;

/// Client runtime with the configured API prefix substituted.
pub fn client_runtime(api_prefix: &str) -> String {
    CLIENT_RUNTIME.replace("{{API_PREFIX}}", &crate::ts::utils::escape_js_string(api_prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_declares_every_listed_name() {
        for name in PRELUDE_TYPE_NAMES {
            let declared = TYPES_PRELUDE.contains(&format!("export type {name}"))
                || TYPES_PRELUDE.contains(&format!("export interface {name}"));
            assert!(declared, "{name} missing from prelude");
        }
    }

    #[test]
    fn test_client_runtime_prefix() {
        let runtime = client_runtime("/v2");
        assert!(runtime.contains("const DEFAULT_API_PREFIX = \"/v2\";"));
        assert!(runtime.contains("export class ApiError extends Error"));
        assert!(!runtime.contains("{{API_PREFIX}}"));
    }
}
